// Generic expired-drying reconciler
//
// Externally triggered recovery pass over both self-dry statuses. Each item
// goes through the same complete-if-expired step as the window end sweep,
// without owner notifications.

use super::{SweepEngine, SweepKind, SweepReport, SweepTally};
use crate::domain::{latest_per_item, HistoryFilter, ItemId, ItemStatus, SweepClock};
use crate::error::Result;
use tracing::debug;

const RECONCILED_STATUSES: [ItemStatus; 2] = [ItemStatus::SelfDrying, ItemStatus::WaitingOptimalTime];

impl SweepEngine {
    pub(super) async fn reconcile_pass(&self, clock: SweepClock) -> Result<SweepReport> {
        let kind = SweepKind::Reconcile;

        let items = self
            .stores
            .items
            .select_by_status(&RECONCILED_STATUSES)
            .await?;
        if items.is_empty() {
            return Ok(SweepReport::empty(kind, "No items in a drying phase"));
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
                debug!(item_id = %item.id, "No self-dry record to reconcile");
                continue;
            };
            match record.end_time {
                Some(end) if clock.has_elapsed(end) => {
                    self.finish_window(item, item.status, record, &mut tally)
                        .await;
                }
                _ => {}
            }
        }

        Ok(tally.finish(kind))
    }
}
