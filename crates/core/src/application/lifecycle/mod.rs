// Lifecycle Service - entry operations that move items into timed statuses

pub mod commit_window;
pub mod completion;
pub mod pickup;
pub mod register;

pub use commit_window::{CommitWindowRequest, WindowCommitment};
pub use completion::OrderCompletion;
pub use pickup::RequestPickupRequest;
pub use register::RegisterItemRequest;

use crate::application::notify::OwnerNotifier;
use crate::application::sweep::DryingStores;
use crate::domain::{Item, Order, OrderId, UserId};
use crate::error::Result;
use crate::port::{IdProvider, TimeProvider};
use std::sync::Arc;

/// Lifecycle Service
pub struct LifecycleService {
    stores: DryingStores,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    owner_notifier: OwnerNotifier,
}

impl LifecycleService {
    pub fn new(
        stores: DryingStores,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        owner_notifier: OwnerNotifier,
    ) -> Self {
        Self {
            stores,
            id_provider,
            time_provider,
            owner_notifier,
        }
    }

    /// Register a new item
    pub async fn register_item(&self, req: RegisterItemRequest) -> Result<Item> {
        register::execute(
            self.stores.items.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    /// Commit a self-dry window
    pub async fn commit_self_dry_window(&self, req: CommitWindowRequest) -> Result<WindowCommitment> {
        commit_window::execute(
            self.stores.transactions.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    /// Ask for a helper pickup
    pub async fn request_pickup(&self, req: RequestPickupRequest) -> Result<Order> {
        pickup::request(
            self.stores.transactions.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            req,
        )
        .await
    }

    pub async fn accept_order(&self, order_id: &OrderId, service_user_id: &UserId) -> Result<Order> {
        pickup::accept(
            self.stores.items.as_ref(),
            self.stores.orders.as_ref(),
            &self.owner_notifier,
            self.time_provider.as_ref(),
            order_id,
            service_user_id,
        )
        .await
    }

    pub async fn start_order(&self, order_id: &OrderId) -> Result<Order> {
        pickup::start(
            self.stores.orders.as_ref(),
            self.time_provider.as_ref(),
            order_id,
        )
        .await
    }

    /// Complete a helper order explicitly
    pub async fn complete_order(&self, order_id: &OrderId) -> Result<OrderCompletion> {
        completion::execute(
            self.stores.transactions.as_ref(),
            &self.owner_notifier,
            self.time_provider.as_ref(),
            order_id,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemStatus, OrderStatus};
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::mocks::InMemoryDryingStore;
    use crate::port::notifier::mocks::MockNotifier;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use crate::port::user_directory::mocks::MockUserDirectory;

    #[tokio::test]
    async fn test_helper_path_end_to_end() {
        let clock = Arc::new(FixedTimeProvider::new(1_700_000_000_000));
        let store = Arc::new(InMemoryDryingStore::new(clock.clone()));
        let users =
            Arc::new(MockUserDirectory::default().with_user("owner-1", "o@example.com", "Owner"));
        let service = LifecycleService::new(
            DryingStores::from_backend(store.clone()),
            Arc::new(SequentialIdProvider::default()),
            clock.clone(),
            OwnerNotifier::new(users, Arc::new(MockNotifier::new_success())),
        );

        let item = service
            .register_item(RegisterItemRequest {
                owner_id: "owner-1".to_string(),
                mite_score: 88,
            })
            .await
            .unwrap();
        let order = service
            .request_pickup(RequestPickupRequest {
                item_id: item.id.clone(),
                predicted_score: Some(12),
            })
            .await
            .unwrap();
        service
            .accept_order(&order.id, &"helper-1".to_string())
            .await
            .unwrap();
        service.start_order(&order.id).await.unwrap();
        let done = service.complete_order(&order.id).await.unwrap();

        assert_eq!(done.order_status, OrderStatus::Completed);
        let item = store.item(&item.id).unwrap();
        assert_eq!(item.status, ItemStatus::Normal);
        assert_eq!(item.mite_score.value(), 12);
    }
}
