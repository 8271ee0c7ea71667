// Self-dry window end sweep

use super::{SweepEngine, SweepKind, SweepReport, SweepTally};
use crate::domain::{
    latest_per_item, HistoryFilter, HistoryRecord, Item, ItemId, ItemStatus, MiteScore, SweepClock,
};
use crate::error::Result;
use crate::port::NotificationKind;
use tracing::{debug, info};

impl SweepEngine {
    pub(super) async fn window_end_pass(&self, clock: SweepClock) -> Result<SweepReport> {
        let kind = SweepKind::WindowEnd;

        let items = self
            .stores
            .items
            .select_by_status(&[ItemStatus::SelfDrying])
            .await?;
        if items.is_empty() {
            return Ok(SweepReport::empty(kind, "No items self-drying"));
        }

        let ids: Vec<ItemId> = items.iter().map(|i| i.id.clone()).collect();
        let latest = latest_per_item(
            self.stores
                .history
                .select_latest_for_items(&ids, HistoryFilter::self_dry().with_end_time())
                .await?,
        );

        let mut tally = SweepTally::default();

        for item in &items {
            tally.processed += 1;

            let Some(record) = latest.get(&item.id) else {
                debug!(item_id = %item.id, "No self-dry record with an end time");
                continue;
            };
            let Some(end) = record.end_time else {
                continue;
            };
            if !clock.has_elapsed(end) {
                continue;
            }

            if let Some(score) = self
                .finish_window(item, ItemStatus::SelfDrying, record, &mut tally)
                .await
            {
                let outcome = self
                    .owner_notifier
                    .notify(item, NotificationKind::WindowEnded, Some(score), clock.now())
                    .await;
                tally.record_notification(outcome);
            }
        }

        Ok(tally.finish(kind))
    }

    /// Complete an expired self-dry window.
    ///
    /// Reverts the item to `normal` and closes the record in one transaction,
    /// then applies the predicted score when present. The record is closed
    /// even without a prediction so the item is left with no active window.
    /// Returns the item's score after the update, or `None` if the item was
    /// not reverted by this call.
    pub(super) async fn finish_window(
        &self,
        item: &Item,
        expected: ItemStatus,
        record: &HistoryRecord,
        tally: &mut SweepTally,
    ) -> Option<MiteScore> {
        match self.close_window(item, expected, record).await {
            Ok(true) => tally.updated += 1,
            Ok(false) => {
                debug!(item_id = %item.id, expected = %expected, "Item status changed, skipping");
                return None;
            }
            Err(e) => {
                tally.record_error(format!(
                    "item {}: failed to close window {}: {}",
                    item.id, record.id, e
                ));
                return None;
            }
        }

        // Status and score counters may diverge
        let mut score = item.mite_score;
        if let Some(after) = record.after_score {
            match self.stores.items.update_mite_score(&item.id, after).await {
                Ok(()) => {
                    tally.mite_scores_updated += 1;
                    score = after;
                }
                Err(e) => tally.record_error(format!(
                    "item {}: failed to update mite score: {}",
                    item.id, e
                )),
            }
        }

        info!(
            item_id = %item.id,
            history_id = %record.id,
            mite_score = score.value(),
            "Self-dry window finished"
        );
        Some(score)
    }

    /// False when the item already left `expected`
    async fn close_window(
        &self,
        item: &Item,
        expected: ItemStatus,
        record: &HistoryRecord,
    ) -> Result<bool> {
        let mut tx = self.stores.transactions.begin_transaction().await?;

        if !tx
            .transition_item(&item.id, expected, ItemStatus::Normal)
            .await?
        {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.mark_history_completed(&record.id).await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{Harness, MINUTE, NOW};
    use crate::domain::{ItemStatus, MiteScore};
    use crate::port::notifier::mocks::MockNotifier;
    use crate::port::NotificationKind;

    #[tokio::test]
    async fn test_expired_window_applies_predicted_score() {
        let h = Harness::new();
        h.item("item-z", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 70 * MINUTE, NOW - 10 * MINUTE, Some(42), NOW - 80 * MINUTE)
            .await;

        let report = h.engine.run_window_end().await;

        assert!(report.success);
        assert_eq!(report.updated_count, 1);
        assert_eq!(report.mite_scores_updated, Some(1));
        assert_eq!(report.notifications_sent, Some(1));

        let item = h.store.item("item-z").unwrap();
        assert_eq!(item.status, ItemStatus::Normal);
        assert_eq!(item.mite_score, MiteScore::new(42).unwrap());
        assert!(h.store.history("his-z").unwrap().completed);

        let sent = h.notifier.sent();
        assert_eq!(sent[0].0, NotificationKind::WindowEnded);
        assert_eq!(sent[0].1.mite_score, Some(42));
    }

    #[tokio::test]
    async fn test_end_is_strict() {
        let h = Harness::new();
        h.item("item-z", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 60 * MINUTE, NOW, Some(42), NOW - 60 * MINUTE)
            .await;

        assert_eq!(h.engine.run_window_end().await.updated_count, 0);

        h.clock.set(NOW + 1);
        assert_eq!(h.engine.run_window_end().await.updated_count, 1);
    }

    #[tokio::test]
    async fn test_missing_prediction_keeps_score() {
        let h = Harness::new();
        h.item("item-z", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 70 * MINUTE, NOW - 10 * MINUTE, None, NOW - 80 * MINUTE)
            .await;

        let report = h.engine.run_window_end().await;

        assert!(report.success);
        assert_eq!(report.updated_count, 1);
        assert_eq!(report.mite_scores_updated, Some(0));
        let item = h.store.item("item-z").unwrap();
        assert_eq!(item.status, ItemStatus::Normal);
        assert_eq!(item.mite_score, MiteScore::new(80).unwrap());
        assert!(h.store.history("his-z").unwrap().completed);
    }

    #[tokio::test]
    async fn test_score_failure_diverges_counters() {
        let h = Harness::new();
        h.item("item-z", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 70 * MINUTE, NOW - 10 * MINUTE, Some(42), NOW - 80 * MINUTE)
            .await;
        h.store.fail_score_writes("item-z");

        let report = h.engine.run_window_end().await;

        assert!(report.success);
        assert_eq!(report.updated_count, 1);
        assert_eq!(report.mite_scores_updated, Some(0));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(h.store.item("item-z").unwrap().status, ItemStatus::Normal);
    }

    #[tokio::test]
    async fn test_failed_history_close_keeps_item_self_drying() {
        let h = Harness::new();
        h.item("item-z", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 70 * MINUTE, NOW - 10 * MINUTE, Some(42), NOW - 80 * MINUTE)
            .await;
        h.store.fail_history_writes("his-z");

        let first = h.engine.run_window_end().await;

        assert!(!first.success);
        assert_eq!(first.updated_count, 0);
        assert_eq!(first.mite_scores_updated, Some(0));
        assert!(first.errors[0].contains("his-z"));
        let item = h.store.item("item-z").unwrap();
        assert_eq!(item.status, ItemStatus::SelfDrying);
        assert_eq!(item.mite_score, MiteScore::new(80).unwrap());
        assert!(!h.store.history("his-z").unwrap().completed);

        h.store.clear_failures();
        let second = h.engine.run_window_end().await;

        assert!(second.success);
        assert_eq!(second.updated_count, 1);
        assert_eq!(second.mite_scores_updated, Some(1));
        let item = h.store.item("item-z").unwrap();
        assert_eq!(item.status, ItemStatus::Normal);
        assert_eq!(item.mite_score, MiteScore::new(42).unwrap());
        assert!(h.store.history("his-z").unwrap().completed);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let h = Harness::new();
        h.item("item-z", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 70 * MINUTE, NOW - 10 * MINUTE, Some(42), NOW - 80 * MINUTE)
            .await;

        assert_eq!(h.engine.run_window_end().await.updated_count, 1);
        let second = h.engine.run_window_end().await;
        assert_eq!(second.updated_count, 0);
        assert_eq!(second.mite_scores_updated, Some(0));
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_transition() {
        let h = Harness::with_notifier(MockNotifier::new_failing());
        h.item("item-z", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 70 * MINUTE, NOW - 10 * MINUTE, Some(42), NOW - 80 * MINUTE)
            .await;

        let report = h.engine.run_window_end().await;

        assert!(report.success);
        assert_eq!(report.errors.len(), 1);
        let item = h.store.item("item-z").unwrap();
        assert_eq!(item.status, ItemStatus::Normal);
        assert_eq!(item.mite_score, MiteScore::new(42).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_owner_is_reported() {
        let h = Harness::new();
        h.item_owned_by("item-z", "ghost", ItemStatus::SelfDrying, 80).await;
        h.window("his-z", "item-z", NOW - 70 * MINUTE, NOW - 10 * MINUTE, Some(42), NOW - 80 * MINUTE)
            .await;

        let report = h.engine.run_window_end().await;
        assert!(report.success);
        assert_eq!(report.notifications_sent, Some(0));
        assert!(report.errors[0].contains("ghost"));
    }
}
