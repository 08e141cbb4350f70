// src/client/poller.rs

//! Periodic index polling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

use crate::client::{AppContext, IndexLoad};
use crate::error::Result;
use crate::notify::DispatchOutcome;
use crate::pipeline::UpdateSet;

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another poll was still running
    Skipped,
    Completed {
        load: IndexLoad,
        updates: UpdateSet,
        dispatch: Option<DispatchOutcome>,
    },
}

/// Clears the in-flight flag when a poll ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Fetch, detect and notify on a fixed interval.
pub struct Poller {
    context: Arc<AppContext>,
    period: Duration,
    in_flight: AtomicBool,
}

impl Poller {
    pub fn new(context: Arc<AppContext>) -> Self {
        let period = Duration::from_secs(context.config().client.poll_interval_secs);
        Self {
            context,
            period,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run one cycle unless one is already in flight.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            log::debug!("Poll already in flight, skipping");
            return Ok(PollOutcome::Skipped);
        }
        let _guard = InFlight(&self.in_flight);

        let load = self.context.load_index().await?;
        let updates = self.context.check_for_updates().await?;
        let dispatch = match self.context.notify().await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log::warn!("Notification failed: {e}");
                None
            }
        };

        Ok(PollOutcome::Completed {
            load,
            updates,
            dispatch,
        })
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!("Polling every {}s", self.period.as_secs());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(PollOutcome::Completed { updates, .. }) if updates.has_updates() => {
                            log::info!("Unread updates: {}", updates.symbols().join(", "));
                        }
                        Ok(_) => {}
                        Err(e) => log::warn!("Poll failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::info!("Polling stopped");
    }
}
