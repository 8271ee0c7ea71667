// Item Domain Model (aggregate root)

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Item ID (opaque, stable for the item's lifetime)
pub type ItemId = String;

/// Reference into the identity collaborator
pub type UserId = String;

/// Item status
///
/// Exactly one value at any instant. The timed statuses are only ever left
/// through a compare-and-set on the expected prior status.
///
/// Edges: `normal -> waiting_optimal_time -> self_drying -> normal` and
/// `normal -> waiting_pickup -> normal`. The reconciler may also take
/// `waiting_optimal_time` straight back to `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Normal,
    WaitingOptimalTime,
    SelfDrying,
    WaitingPickup,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Normal,
        ItemStatus::WaitingOptimalTime,
        ItemStatus::SelfDrying,
        ItemStatus::WaitingPickup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Normal => "normal",
            ItemStatus::WaitingOptimalTime => "waiting_optimal_time",
            ItemStatus::SelfDrying => "self_drying",
            ItemStatus::WaitingPickup => "waiting_pickup",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}

/// Mite score: integer risk estimate in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct MiteScore(u8);

impl MiteScore {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DomainError::ScoreOutOfRange(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for MiteScore {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MiteScore> for i64 {
    fn from(score: MiteScore) -> Self {
        i64::from(score.0)
    }
}

impl fmt::Display for MiteScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub owner_id: UserId,
    pub status: ItemStatus,
    pub mite_score: MiteScore,
    pub updated_at: i64, // epoch ms
}

impl Item {
    /// Create a new item in `Normal` status
    ///
    /// # Arguments
    ///
    /// * `id` - Item ID (injected, not generated)
    /// * `owner_id` - Owning user
    /// * `mite_score` - Initial score estimate
    /// * `now_millis` - Creation timestamp (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        mite_score: MiteScore,
        now_millis: i64,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            status: ItemStatus::Normal,
            mite_score,
            updated_at: now_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ItemStatus::ALL {
            assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
        }
        assert!("drying".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn test_mite_score_bounds() {
        assert!(MiteScore::new(0).is_ok());
        assert!(MiteScore::new(100).is_ok());
        assert_eq!(MiteScore::new(101), Err(DomainError::ScoreOutOfRange(101)));
        assert_eq!(MiteScore::new(-1), Err(DomainError::ScoreOutOfRange(-1)));
    }

    #[test]
    fn test_mite_score_rejects_out_of_range_json() {
        let parsed: std::result::Result<MiteScore, _> = serde_json::from_str("150");
        assert!(parsed.is_err());
        let parsed: MiteScore = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.value(), 42);
    }
}
