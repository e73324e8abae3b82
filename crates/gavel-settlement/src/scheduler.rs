//! Deadline scheduler — the background task that triggers settlement.
//!
//! Runs on a fixed poll interval, scanning for ongoing auctions whose
//! deadline falls within the lookahead window, and finalizes the ones
//! actually past deadline. The scheduler is advisory and at-least-once:
//! overlapping scans (or a manual admin finalize racing a scan) may fire
//! the finalizer twice for one auction, and the finalizer's claim is the
//! only thing that prevents double settlement. One auction's failure is
//! logged and never stops the rest of the scan.

use std::sync::Arc;

use chrono::Utc;
use gavel_types::{GavelError, SchedulerConfig, constants};
use gavel_gateway::{AccountDirectory, ReservationGateway};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::finalizer::Finalizer;

/// Periodically scans the store and finalizes due auctions.
pub struct DeadlineScheduler<G, D> {
    finalizer: Arc<Finalizer<G, D>>,
    config: SchedulerConfig,
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the task to stop and wait for it to drain the current scan.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl<G, D> DeadlineScheduler<G, D>
where
    G: ReservationGateway + 'static,
    D: AccountDirectory + 'static,
{
    #[must_use]
    pub fn new(finalizer: Arc<Finalizer<G, D>>, config: SchedulerConfig) -> Self {
        Self { finalizer, config }
    }

    /// Spawn the scan loop on the ambient tokio runtime.
    #[must_use]
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let task = tokio::spawn(async move {
            info!(
                poll_interval = ?self.config.poll_interval,
                lookahead = ?self.config.lookahead,
                "deadline scheduler started"
            );
            let mut ticker = tokio::time::interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.scan().await,
                    _ = stop.changed() => {
                        if *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("deadline scheduler stopped");
        });
        SchedulerHandle { shutdown, task }
    }

    /// One scan pass: finalize every ongoing auction past its deadline.
    pub async fn scan(&self) {
        let now = Utc::now();
        let lookahead = chrono::Duration::from_std(self.config.lookahead)
            .unwrap_or_else(|_| chrono::Duration::seconds(constants::DEFAULT_LOOKAHEAD_SECS as i64));

        let store = self.finalizer.store();
        let due = store.due_for_settlement(now, lookahead);
        if due.is_empty() {
            return;
        }
        debug!(candidates = due.len(), "deadline scan");

        for auction_id in due {
            let Some(auction) = store.get(auction_id) else {
                continue;
            };
            // Candidates inside the lookahead window but not yet due get
            // picked up by a later scan.
            if auction.deadline > now {
                continue;
            }
            match self.finalizer.finalize(auction_id).await {
                Ok(report) => {
                    info!(
                        auction = %auction_id,
                        settled = report.fully_settled(),
                        "scheduler finalized auction"
                    );
                }
                // Someone else (another scan, an admin call) won the
                // claim first; that is the idempotency backstop working.
                Err(GavelError::AlreadyFinalized(_)) => {}
                Err(err) => {
                    warn!(auction = %auction_id, %err, "scheduler failed to finalize auction");
                }
            }
        }
    }
}
