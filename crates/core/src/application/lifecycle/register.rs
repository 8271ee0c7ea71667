// Register Item Use Case

use crate::domain::{Item, MiteScore};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, ItemStore, RecordKind, TimeProvider};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Register request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterItemRequest {
    pub owner_id: String,
    pub mite_score: i64,
}

/// Validate register request
pub fn validate_request(req: &RegisterItemRequest) -> Result<MiteScore> {
    if req.owner_id.trim().is_empty() {
        return Err(AppError::Validation("owner_id cannot be empty".to_string()));
    }
    Ok(MiteScore::new(req.mite_score)?)
}

/// Execute register use case; the item starts `normal`
pub async fn execute(
    items: &dyn ItemStore,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: RegisterItemRequest,
) -> Result<Item> {
    let score = validate_request(&req)?;

    let item = Item::new(
        id_provider.generate_id(RecordKind::Item),
        req.owner_id,
        score,
        time_provider.now_millis(),
    );
    items.insert(&item).await?;

    info!(item_id = %item.id, owner_id = %item.owner_id, mite_score = score.value(), "Item registered");
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, ItemStatus};
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::mocks::InMemoryDryingStore;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_register_creates_normal_item() {
        let clock = Arc::new(FixedTimeProvider::new(1_000));
        let store = InMemoryDryingStore::new(clock.clone());
        let ids = SequentialIdProvider::default();

        let req = RegisterItemRequest {
            owner_id: "owner-1".to_string(),
            mite_score: 75,
        };
        let item = execute(&store, &ids, clock.as_ref(), req).await.unwrap();

        assert_eq!(item.id, "itm-1");
        assert_eq!(item.status, ItemStatus::Normal);
        assert_eq!(item.updated_at, 1_000);
        assert_eq!(store.item("itm-1").unwrap(), item);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let req = RegisterItemRequest {
            owner_id: " ".to_string(),
            mite_score: 10,
        };
        assert!(matches!(validate_request(&req), Err(AppError::Validation(_))));

        let req = RegisterItemRequest {
            owner_id: "owner-1".to_string(),
            mite_score: 101,
        };
        assert!(matches!(
            validate_request(&req),
            Err(AppError::Domain(DomainError::ScoreOutOfRange(101)))
        ));
    }
}
