//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results. Sweep methods answer
//! with `futon_core::application::SweepReport` directly.

use futon_core::domain::{ItemStatus, OrderStatus};
use serde::{Deserialize, Serialize};

/// sweep.reconcile.v1 - Shared secret for the gated sweep
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

/// item.register.v1
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterItemRequest {
    pub owner_id: String,
    pub mite_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterItemResponse {
    pub item_id: String,
    pub status: ItemStatus,
}

/// item.commit_window.v1
#[derive(Debug, Serialize, Deserialize)]
pub struct CommitWindowRequest {
    pub item_id: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub predicted_score: Option<i64>,
}

/// order.request.v1
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestPickupRequest {
    pub item_id: String,
    #[serde(default)]
    pub predicted_score: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPickupResponse {
    pub order_id: String,
    pub item_id: String,
    pub status: OrderStatus,
}

/// order.accept.v1
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptOrderRequest {
    pub order_id: String,
    pub service_user_id: String,
}

/// order.start.v1 / order.complete.v1
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub order_id: String,
    pub status: OrderStatus,
}

/// admin.stats.v1 - Get system statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub normal_items: i64,
    pub waiting_optimal_time_items: i64,
    pub self_drying_items: i64,
    pub waiting_pickup_items: i64,
    pub active_orders: i64,
    pub uptime_seconds: i64,
    pub version: String,
}
