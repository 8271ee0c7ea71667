// Self-dry window start sweep

use super::{SweepEngine, SweepKind, SweepReport, SweepTally};
use crate::domain::{latest_per_item, HistoryFilter, ItemId, ItemStatus, SweepClock};
use crate::error::Result;
use crate::port::NotificationKind;
use tracing::{debug, info};

impl SweepEngine {
    pub(super) async fn window_start_pass(&self, clock: SweepClock) -> Result<SweepReport> {
        let kind = SweepKind::WindowStart;

        let items = self
            .stores
            .items
            .select_by_status(&[ItemStatus::WaitingOptimalTime])
            .await?;
        if items.is_empty() {
            return Ok(SweepReport::empty(kind, "No items waiting for their window"));
        }

        let ids: Vec<ItemId> = items.iter().map(|i| i.id.clone()).collect();
        let latest = latest_per_item(
            self.stores
                .history
                .select_latest_for_items(&ids, HistoryFilter::self_dry())
                .await?,
        );

        let mut tally = SweepTally::default();

        for item in &items {
            tally.processed += 1;

            let Some(start) = latest.get(&item.id).and_then(|r| r.start_time) else {
                debug!(item_id = %item.id, "No scheduled self-dry window");
                continue;
            };
            if !clock.has_started(start) {
                continue;
            }

            match self
                .stores
                .items
                .transition_status(&item.id, ItemStatus::WaitingOptimalTime, ItemStatus::SelfDrying)
                .await
            {
                Ok(true) => {
                    tally.updated += 1;
                    info!(item_id = %item.id, start_time = start, "Self-dry window started");
                    let outcome = self
                        .owner_notifier
                        .notify(item, NotificationKind::WindowStarted, None, clock.now())
                        .await;
                    tally.record_notification(outcome);
                }
                Ok(false) => debug!(item_id = %item.id, "Item already left waiting_optimal_time"),
                Err(e) => {
                    tally.record_error(format!("item {}: failed to start window: {}", item.id, e))
                }
            }
        }

        Ok(tally.finish(kind))
    }
}
