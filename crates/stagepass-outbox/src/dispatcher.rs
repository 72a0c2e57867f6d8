//! Periodic drain of undispatched outbox records.
//!
//! Delivery is at-least-once: a record is only flipped to dispatched after
//! the notification adapter accepted it, and a failed flip leaves it queued
//! for the next pass. Consumers deduplicate by the record id.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{info, warn};

use stagepass_core::clients::NotificationClient;
use stagepass_core::store::OutboxStore;

/// Counts for a single drain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: usize,
    pub failed: usize,
}

/// Background worker feeding outbox records to the notification adapter.
pub struct OutboxDispatcher {
    store: Arc<dyn OutboxStore>,
    notifier: Arc<dyn NotificationClient>,
    interval: Duration,
}

impl OutboxDispatcher {
    #[must_use]
    pub fn new(
        store: Arc<dyn OutboxStore>,
        notifier: Arc<dyn NotificationClient>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            interval,
        }
    }

    /// Runs forever: one drain pass at startup, then one per interval. A
    /// pass that outlives the interval simply delays the next one; passes
    /// never overlap.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let stats = self.tick().await;
            if stats.dispatched > 0 || stats.failed > 0 {
                info!(
                    dispatched = stats.dispatched,
                    failed = stats.failed,
                    "outbox drain pass finished"
                );
            }
        }
    }

    /// One drain pass: snapshot the undispatched records, then deliver each
    /// in its own task.
    pub async fn tick(&self) -> DispatchStats {
        let records = match self.store.fetch_undispatched().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "outbox fetch failed, retrying next pass");
                return DispatchStats::default();
            }
        };
        if records.is_empty() {
            return DispatchStats::default();
        }

        let mut tasks = JoinSet::new();
        for record in records {
            let store = Arc::clone(&self.store);
            let notifier = Arc::clone(&self.notifier);
            tasks.spawn(async move {
                match notifier.send_event(&record).await {
                    Ok(()) => match store.mark_dispatched(record.id).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(
                                outbox_id = %record.id,
                                error = %e,
                                "delivered but not marked, consumers may see it again"
                            );
                            false
                        }
                    },
                    Err(e) => {
                        warn!(
                            outbox_id = %record.id,
                            event_type = record.event_type.as_str(),
                            error = %e,
                            "notification failed, record stays queued"
                        );
                        false
                    }
                }
            });
        }

        let mut stats = DispatchStats::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => stats.dispatched += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    warn!(error = %e, "outbox dispatch task failed to complete");
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}
