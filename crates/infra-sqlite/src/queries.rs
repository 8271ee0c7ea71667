// Statements shared by the pooled store and its transactions
//
// Every status write is a compare-and-set: `WHERE id = ? AND status = ?`,
// reported through `rows_affected()`.

use crate::error::map_sqlx_error;
use crate::rows::{collect, HistoryRow, ItemRow, OrderRow};
use futon_core::domain::{
    HistoryFilter, HistoryRecord, Item, ItemId, ItemStatus, MiteScore, Order, OrderStatus,
};
use futon_core::error::Result;
use sqlx::{Executor, QueryBuilder, Sqlite};

const ITEM_COLUMNS: &str = "id, owner_id, status, mite_score, updated_at";
const ORDER_COLUMNS: &str =
    "id, item_id, status, service_user_id, history_id, created_at, updated_at";
const HISTORY_COLUMNS: &str =
    "id, item_id, is_self, start_time, end_time, before_score, after_score, completed, created_at";

/// Active (non-terminal) order statuses as a SQL list
const ACTIVE_ORDER_SQL: &str = "('pending', 'accepted', 'in_progress')";

pub(crate) async fn insert_item<'e, E>(executor: E, item: &Item) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO items (id, owner_id, status, mite_score, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.owner_id)
    .bind(item.status.as_str())
    .bind(i64::from(item.mite_score))
    .bind(item.updated_at)
    .bind(item.updated_at)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

pub(crate) async fn find_item<'e, E>(executor: E, id: &str) -> Result<Option<Item>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS);
    let row: Option<ItemRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(ItemRow::into_item).transpose()
}

pub(crate) async fn select_items_by_status<'e, E>(
    executor: E,
    statuses: &[ItemStatus],
) -> Result<Vec<Item>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM items WHERE status IN (", ITEM_COLUMNS));
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(status.as_str());
    }
    builder.push(") ORDER BY id");

    let rows: Vec<ItemRow> = builder
        .build_query_as()
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    collect(rows, ItemRow::into_item)
}

pub(crate) async fn transition_item<'e, E>(
    executor: E,
    id: &str,
    expected: ItemStatus,
    next: ItemStatus,
    now: i64,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE items SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(next.as_str())
        .bind(now)
        .bind(id)
        .bind(expected.as_str())
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn update_mite_score<'e, E>(
    executor: E,
    id: &str,
    score: MiteScore,
    now: i64,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE items SET mite_score = ?, updated_at = ? WHERE id = ?")
        .bind(i64::from(score))
        .bind(now)
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}

pub(crate) async fn count_items_by_status<'e, E>(executor: E, status: ItemStatus) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE status = ?")
        .bind(status.as_str())
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)
}

pub(crate) async fn insert_order<'e, E>(executor: E, order: &Order) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO orders (id, item_id, status, service_user_id, history_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&order.id)
    .bind(&order.item_id)
    .bind(order.status.as_str())
    .bind(&order.service_user_id)
    .bind(&order.history_id)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

pub(crate) async fn find_order<'e, E>(executor: E, id: &str) -> Result<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(OrderRow::into_order).transpose()
}

pub(crate) async fn find_active_order<'e, E>(executor: E, item_id: &str) -> Result<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM orders WHERE item_id = ? AND status IN {} ORDER BY created_at DESC LIMIT 1",
        ORDER_COLUMNS, ACTIVE_ORDER_SQL
    );
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(item_id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(OrderRow::into_order).transpose()
}

/// Pending orders for the given items, newest first
pub(crate) async fn select_pending_orders<'e, E>(
    executor: E,
    item_ids: &[ItemId],
) -> Result<Vec<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM orders WHERE status = 'pending' AND item_id IN (",
        ORDER_COLUMNS
    ));
    let mut list = builder.separated(", ");
    for id in item_ids {
        list.push_bind(id);
    }
    builder.push(") ORDER BY created_at DESC, id");

    let rows: Vec<OrderRow> = builder
        .build_query_as()
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    collect(rows, OrderRow::into_order)
}

/// Compare-and-set; terminal statuses never match as `expected`
pub(crate) async fn transition_order<'e, E>(
    executor: E,
    id: &str,
    expected: OrderStatus,
    next: OrderStatus,
    now: i64,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    if expected.is_terminal() {
        return Ok(false);
    }
    let result =
        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(next.as_str())
            .bind(now)
            .bind(id)
            .bind(expected.as_str())
            .execute(executor)
            .await
            .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn accept_order<'e, E>(
    executor: E,
    id: &str,
    service_user_id: &str,
    now: i64,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = 'accepted', service_user_id = ?, updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(service_user_id)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() == 1)
}

/// Any non-terminal status -> completed
pub(crate) async fn complete_order<'e, E>(executor: E, id: &str, now: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE orders SET status = 'completed', updated_at = ? WHERE id = ? AND status IN {}",
        ACTIVE_ORDER_SQL
    );
    let result = sqlx::query(&sql)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn count_active_orders<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM orders WHERE status IN {}", ACTIVE_ORDER_SQL);
    sqlx::query_scalar(&sql)
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)
}

pub(crate) async fn insert_history<'e, E>(executor: E, record: &HistoryRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO histories (
            id, item_id, is_self, start_time, end_time,
            before_score, after_score, completed, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.item_id)
    .bind(record.is_self)
    .bind(record.start_time)
    .bind(record.end_time)
    .bind(record.before_score.map(i64::from))
    .bind(record.after_score.map(i64::from))
    .bind(record.completed)
    .bind(record.created_at)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

pub(crate) async fn find_history<'e, E>(executor: E, id: &str) -> Result<Option<HistoryRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM histories WHERE id = ?", HISTORY_COLUMNS);
    let row: Option<HistoryRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(HistoryRow::into_record).transpose()
}

/// Records for the given items matching `filter`, newest first.
///
/// Equal `created_at` values fall back to insertion order (newest first).
pub(crate) async fn select_histories<'e, E>(
    executor: E,
    item_ids: &[ItemId],
    filter: HistoryFilter,
) -> Result<Vec<HistoryRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM histories WHERE item_id IN (",
        HISTORY_COLUMNS
    ));
    let mut list = builder.separated(", ");
    for id in item_ids {
        list.push_bind(id);
    }
    builder.push(")");

    if filter.self_only {
        builder.push(" AND is_self = 1");
    }
    if filter.require_end_time {
        builder.push(" AND end_time IS NOT NULL");
    }
    if filter.incomplete_only {
        builder.push(" AND completed = 0");
    }
    builder.push(" ORDER BY created_at DESC, rowid DESC");

    let rows: Vec<HistoryRow> = builder
        .build_query_as()
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    collect(rows, HistoryRow::into_record)
}

pub(crate) async fn complete_history<'e, E>(executor: E, id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE histories SET completed = 1 WHERE id = ? AND completed = 0")
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn delete_incomplete_histories<'e, E>(executor: E, item_id: &str) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM histories WHERE item_id = ? AND completed = 0")
        .bind(item_id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(result.rows_affected())
}
