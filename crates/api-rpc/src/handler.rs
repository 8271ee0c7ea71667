//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC params to the sweep engine and lifecycle
//! service.

use crate::error::to_rpc_error;
use crate::types::{
    AcceptOrderRequest, CommitWindowRequest, OrderRequest, OrderStatusResponse, ReconcileRequest,
    RegisterItemRequest, RegisterItemResponse, RequestPickupRequest, RequestPickupResponse,
    StatsResponse,
};
use futon_core::application::lifecycle::{self, WindowCommitment};
use futon_core::application::{
    LifecycleService, OrderCompletion, ReconcileGate, SweepEngine, SweepReport,
};
use futon_core::domain::ItemStatus;
use futon_core::port::{ItemStore, OrderStore};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Instant;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    engine: Arc<SweepEngine>,
    lifecycle: Arc<LifecycleService>,
    gate: ReconcileGate,
    items: Arc<dyn ItemStore>,
    orders: Arc<dyn OrderStore>,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        engine: Arc<SweepEngine>,
        lifecycle: Arc<LifecycleService>,
        gate: ReconcileGate,
        items: Arc<dyn ItemStore>,
        orders: Arc<dyn OrderStore>,
    ) -> Self {
        Self {
            engine,
            lifecycle,
            gate,
            items,
            orders,
            start_time: Instant::now(),
        }
    }

    /// sweep.pickup_timeout.v1
    pub async fn sweep_pickup_timeout(&self) -> Result<SweepReport, ErrorObjectOwned> {
        Ok(self.engine.run_pickup_timeout().await)
    }

    /// sweep.window_start.v1
    pub async fn sweep_window_start(&self) -> Result<SweepReport, ErrorObjectOwned> {
        Ok(self.engine.run_window_start().await)
    }

    /// sweep.window_end.v1
    pub async fn sweep_window_end(&self) -> Result<SweepReport, ErrorObjectOwned> {
        Ok(self.engine.run_window_end().await)
    }

    /// sweep.reconcile.v1
    pub async fn sweep_reconcile(
        &self,
        params: ReconcileRequest,
    ) -> Result<SweepReport, ErrorObjectOwned> {
        Ok(self
            .engine
            .run_reconcile(&self.gate, params.api_key.as_deref())
            .await)
    }

    /// item.register.v1
    pub async fn register_item(
        &self,
        params: RegisterItemRequest,
    ) -> Result<RegisterItemResponse, ErrorObjectOwned> {
        let item = self
            .lifecycle
            .register_item(lifecycle::RegisterItemRequest {
                owner_id: params.owner_id,
                mite_score: params.mite_score,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(RegisterItemResponse {
            item_id: item.id,
            status: item.status,
        })
    }

    /// item.commit_window.v1
    pub async fn commit_window(
        &self,
        params: CommitWindowRequest,
    ) -> Result<WindowCommitment, ErrorObjectOwned> {
        self.lifecycle
            .commit_self_dry_window(lifecycle::CommitWindowRequest {
                item_id: params.item_id,
                start_time: params.start_time,
                end_time: params.end_time,
                predicted_score: params.predicted_score,
            })
            .await
            .map_err(to_rpc_error)
    }

    /// order.request.v1
    pub async fn request_pickup(
        &self,
        params: RequestPickupRequest,
    ) -> Result<RequestPickupResponse, ErrorObjectOwned> {
        let order = self
            .lifecycle
            .request_pickup(lifecycle::RequestPickupRequest {
                item_id: params.item_id,
                predicted_score: params.predicted_score,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(RequestPickupResponse {
            order_id: order.id,
            item_id: order.item_id,
            status: order.status,
        })
    }

    /// order.accept.v1
    pub async fn accept_order(
        &self,
        params: AcceptOrderRequest,
    ) -> Result<OrderStatusResponse, ErrorObjectOwned> {
        let order = self
            .lifecycle
            .accept_order(&params.order_id, &params.service_user_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(OrderStatusResponse {
            order_id: order.id,
            status: order.status,
        })
    }

    /// order.start.v1
    pub async fn start_order(
        &self,
        params: OrderRequest,
    ) -> Result<OrderStatusResponse, ErrorObjectOwned> {
        let order = self
            .lifecycle
            .start_order(&params.order_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(OrderStatusResponse {
            order_id: order.id,
            status: order.status,
        })
    }

    /// order.complete.v1
    pub async fn complete_order(
        &self,
        params: OrderRequest,
    ) -> Result<OrderCompletion, ErrorObjectOwned> {
        self.lifecycle
            .complete_order(&params.order_id)
            .await
            .map_err(to_rpc_error)
    }

    /// admin.stats.v1
    pub async fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        Ok(StatsResponse {
            normal_items: self.count_items(ItemStatus::Normal).await?,
            waiting_optimal_time_items: self.count_items(ItemStatus::WaitingOptimalTime).await?,
            self_drying_items: self.count_items(ItemStatus::SelfDrying).await?,
            waiting_pickup_items: self.count_items(ItemStatus::WaitingPickup).await?,
            active_orders: self.orders.count_active().await.map_err(to_rpc_error)?,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
            version: futon_core::VERSION.to_string(),
        })
    }

    async fn count_items(&self, status: ItemStatus) -> Result<i64, ErrorObjectOwned> {
        self.items
            .count_by_status(status)
            .await
            .map_err(to_rpc_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use futon_core::application::{DryingStores, OwnerNotifier, SweepConfig};
    use futon_core::port::id_provider::mocks::SequentialIdProvider;
    use futon_core::port::mocks::InMemoryDryingStore;
    use futon_core::port::notifier::mocks::MockNotifier;
    use futon_core::port::time_provider::mocks::FixedTimeProvider;
    use futon_core::port::user_directory::mocks::MockUserDirectory;

    fn handler(secret: Option<&str>) -> RpcHandler {
        let clock = Arc::new(FixedTimeProvider::new(1_700_000_000_000));
        let store = Arc::new(InMemoryDryingStore::new(clock.clone()));
        let stores = DryingStores::from_backend(store);
        let owner_notifier = OwnerNotifier::new(
            Arc::new(MockUserDirectory::default()),
            Arc::new(MockNotifier::new_success()),
        );
        let engine = SweepEngine::new(
            stores.clone(),
            owner_notifier.clone(),
            clock.clone(),
            SweepConfig::default(),
        );
        let lifecycle = LifecycleService::new(
            stores.clone(),
            Arc::new(SequentialIdProvider::default()),
            clock,
            owner_notifier,
        );
        RpcHandler::new(
            Arc::new(engine),
            Arc::new(lifecycle),
            ReconcileGate::new(secret.map(str::to_string)),
            stores.items,
            stores.orders,
        )
    }

    #[tokio::test]
    async fn test_register_and_stats() {
        let handler = handler(None);
        let created = handler
            .register_item(RegisterItemRequest {
                owner_id: "owner-1".to_string(),
                mite_score: 50,
            })
            .await
            .unwrap();
        assert_eq!(created.status, ItemStatus::Normal);

        let err = handler
            .register_item(RegisterItemRequest {
                owner_id: "owner-1".to_string(),
                mite_score: 500,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);

        let stats = handler.stats().await.unwrap();
        assert_eq!(stats.normal_items, 1);
        assert_eq!(stats.active_orders, 0);
    }

    #[tokio::test]
    async fn test_reconcile_rejection_is_a_report() {
        let handler = handler(Some("s3cret"));
        let report = handler
            .sweep_reconcile(ReconcileRequest { api_key: None })
            .await
            .unwrap();
        assert!(!report.success);

        let report = handler
            .sweep_reconcile(ReconcileRequest {
                api_key: Some("s3cret".to_string()),
            })
            .await
            .unwrap();
        assert!(report.success);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let handler = handler(None);
        let err = handler
            .complete_order(OrderRequest {
                order_id: "ord-404".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);
    }
}
