// SQLite row representations

use futon_core::domain::{HistoryRecord, Item, ItemStatus, MiteScore, Order, OrderStatus};
use futon_core::error::{AppError, Result};

fn decode_score(column: &str, value: i64) -> Result<MiteScore> {
    MiteScore::new(value).map_err(|e| AppError::Database(format!("Corrupt {}: {}", column, e)))
}

fn decode_optional_score(column: &str, value: Option<i64>) -> Result<Option<MiteScore>> {
    value.map(|v| decode_score(column, v)).transpose()
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    id: String,
    owner_id: String,
    status: String,
    mite_score: i64,
    updated_at: i64,
}

impl ItemRow {
    pub(crate) fn into_item(self) -> Result<Item> {
        // Unknown values are corruption, never silently mapped to a default
        let status: ItemStatus = self
            .status
            .parse()
            .map_err(|e| AppError::Database(format!("Item {}: {}", self.id, e)))?;

        Ok(Item {
            mite_score: decode_score("mite_score", self.mite_score)?,
            id: self.id,
            owner_id: self.owner_id,
            status,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRow {
    id: String,
    item_id: String,
    status: String,
    service_user_id: Option<String>,
    history_id: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    pub(crate) fn into_order(self) -> Result<Order> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| AppError::Database(format!("Order {}: {}", self.id, e)))?;

        Ok(Order {
            id: self.id,
            item_id: self.item_id,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            service_user_id: self.service_user_id,
            history_id: self.history_id,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HistoryRow {
    id: String,
    item_id: String,
    is_self: bool,
    start_time: Option<i64>,
    end_time: Option<i64>,
    before_score: Option<i64>,
    after_score: Option<i64>,
    completed: bool,
    created_at: i64,
}

impl HistoryRow {
    pub(crate) fn into_record(self) -> Result<HistoryRecord> {
        Ok(HistoryRecord {
            before_score: decode_optional_score("before_score", self.before_score)?,
            after_score: decode_optional_score("after_score", self.after_score)?,
            id: self.id,
            item_id: self.item_id,
            is_self: self.is_self,
            start_time: self.start_time,
            end_time: self.end_time,
            completed: self.completed,
            created_at: self.created_at,
        })
    }
}

pub(crate) fn collect<R, T>(rows: Vec<R>, convert: fn(R) -> Result<T>) -> Result<Vec<T>> {
    rows.into_iter().map(convert).collect()
}
