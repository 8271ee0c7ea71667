// Commit Self-Dry Window Use Case

use crate::domain::{DryingWindow, HistoryId, HistoryRecord, ItemId, ItemStatus, MiteScore};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, RecordKind, TimeProvider, TransactionalDryingStore};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Commit window request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitWindowRequest {
    pub item_id: ItemId,
    pub start_time: i64,
    pub end_time: i64,
    /// Predicted mite score once the window has passed
    #[serde(default)]
    pub predicted_score: Option<i64>,
}

/// Committed window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCommitment {
    pub item_id: ItemId,
    pub history_id: HistoryId,
    pub status: ItemStatus,
}

/// Execute commit window use case (with transaction for atomicity)
///
/// Inserts the self-dry record and moves the item
/// `normal -> waiting_optimal_time` in one unit of work.
pub async fn execute(
    store: &dyn TransactionalDryingStore,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: CommitWindowRequest,
) -> Result<WindowCommitment> {
    let window = DryingWindow::new(req.start_time, req.end_time)?;
    let predicted = req.predicted_score.map(MiteScore::new).transpose()?;

    let mut tx = store.begin_transaction().await?;

    let item = tx
        .find_item(&req.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", req.item_id)))?;

    if item.status != ItemStatus::Normal {
        tx.rollback().await?;
        return Err(AppError::InvalidState(format!(
            "Item {} is {}, expected normal",
            item.id, item.status
        )));
    }

    let record = HistoryRecord::self_dry(
        id_provider.generate_id(RecordKind::History),
        item.id.clone(),
        window,
        item.mite_score,
        predicted,
        time_provider.now_millis(),
    );
    tx.insert_history(&record).await?;

    if !tx
        .transition_item(&item.id, ItemStatus::Normal, ItemStatus::WaitingOptimalTime)
        .await?
    {
        tx.rollback().await?;
        return Err(AppError::Conflict(format!(
            "Item {} changed status concurrently",
            item.id
        )));
    }

    tx.commit().await?;

    info!(
        item_id = %item.id,
        history_id = %record.id,
        start_time = window.start(),
        end_time = window.end(),
        "Self-dry window committed"
    );

    Ok(WindowCommitment {
        item_id: item.id,
        history_id: record.id,
        status: ItemStatus::WaitingOptimalTime,
    })
}
