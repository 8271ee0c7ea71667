// History Domain Model (drying attempts per item)

use crate::domain::error::{DomainError, Result};
use crate::domain::item::{ItemId, MiteScore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// History record ID
pub type HistoryId = String;

/// Committed self-dry window, `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryingWindow {
    start: i64,
    end: i64,
}

impl DryingWindow {
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start >= end {
            return Err(DomainError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }
}

/// History record
///
/// Created when a window is committed (or a pickup is requested), mutated once
/// at completion, never deleted once completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: HistoryId,
    pub item_id: ItemId,
    pub is_self: bool,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub before_score: Option<MiteScore>,
    pub after_score: Option<MiteScore>, // predicted outcome
    pub completed: bool,
    pub created_at: i64, // ordering key for "latest per item"
}

impl HistoryRecord {
    /// Self-dry record for a committed window
    pub fn self_dry(
        id: impl Into<String>,
        item_id: impl Into<String>,
        window: DryingWindow,
        before_score: MiteScore,
        after_score: Option<MiteScore>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            is_self: true,
            start_time: Some(window.start()),
            end_time: Some(window.end()),
            before_score: Some(before_score),
            after_score,
            completed: false,
            created_at,
        }
    }

    /// Helper-path record; the window is unknown until the helper returns the item
    pub fn helper(
        id: impl Into<String>,
        item_id: impl Into<String>,
        before_score: MiteScore,
        after_score: Option<MiteScore>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            is_self: false,
            start_time: None,
            end_time: None,
            before_score: Some(before_score),
            after_score,
            completed: false,
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }

    pub fn window(&self) -> Option<DryingWindow> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => DryingWindow::new(start, end).ok(),
            _ => None,
        }
    }
}

/// Predicate for ledger selections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub self_only: bool,
    pub require_end_time: bool,
    pub incomplete_only: bool,
}

impl HistoryFilter {
    /// Self-dry records only
    pub fn self_dry() -> Self {
        Self {
            self_only: true,
            ..Self::default()
        }
    }

    pub fn with_end_time(mut self) -> Self {
        self.require_end_time = true;
        self
    }

    pub fn incomplete(mut self) -> Self {
        self.incomplete_only = true;
        self
    }

    pub fn matches(&self, record: &HistoryRecord) -> bool {
        (!self.self_only || record.is_self)
            && (!self.require_end_time || record.end_time.is_some())
            && (!self.incomplete_only || !record.completed)
    }
}

/// Reduce a selection to the authoritative record per item.
///
/// The newest record by `created_at` wins. On equal timestamps the record seen
/// first wins, so a store that returns rows newest-first keeps its own order.
pub fn latest_per_item(records: Vec<HistoryRecord>) -> HashMap<ItemId, HistoryRecord> {
    let mut latest: HashMap<ItemId, HistoryRecord> = HashMap::new();
    for record in records {
        match latest.get(&record.item_id) {
            Some(current) if current.created_at >= record.created_at => {}
            _ => {
                latest.insert(record.item_id.clone(), record);
            }
        }
    }
    latest
}
