//! Scan count watcher
//!
//! Follows one tracked code's scan count on a fixed interval and stops on
//! its own when the code is deleted, when the subscriber unsubscribes, or
//! after too many consecutive failures.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::model::TrackedCode;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Anything the poller can read a tracked code's stats from
pub trait StatsSource: Clone + Send + Sync + 'static {
    fn fetch_stats(&self, short_code: &str) -> Result<TrackedCode, LedgerError>;
}

impl StatsSource for Ledger {
    fn fetch_stats(&self, short_code: &str) -> Result<TrackedCode, LedgerError> {
        self.stats(short_code)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    /// Delay between polls; anything under a millisecond is raised to one
    pub interval: Duration,
    /// Consecutive failures (other than not found) tolerated before giving up
    pub max_failures: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_failures: 3,
        }
    }
}

/// Emitted on the first successful poll and whenever the count changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanUpdate {
    pub scan_count: u64,
    pub last_scanned: Option<DateTime<Utc>>,
}

/// Why a poller stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The code no longer exists
    Deleted,
    /// The subscriber stopped or dropped the subscription
    Cancelled,
    /// Too many consecutive failures
    GaveUp { failures: u32 },
}

/// Handle to a running poller
pub struct Subscription {
    updates: mpsc::Receiver<ScanUpdate>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<PollOutcome>,
}

impl Subscription {
    /// Next update, or `None` once the poller has stopped
    pub async fn recv(&mut self) -> Option<ScanUpdate> {
        self.updates.recv().await
    }

    /// Stops polling and returns how the poller ended
    ///
    /// If the poller had already stopped on its own, that outcome is returned.
    pub async fn stop(mut self) -> PollOutcome {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        join_outcome(self.task).await
    }

    /// Waits for the poller to stop on its own, discarding pending updates
    pub async fn finished(mut self) -> PollOutcome {
        while self.updates.recv().await.is_some() {}
        join_outcome(self.task).await
    }
}

/// Outcome of the poll task; a panic inside it is resumed in the caller
async fn join_outcome(task: JoinHandle<PollOutcome>) -> PollOutcome {
    match task.await {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => PollOutcome::Cancelled,
    }
}

/// Starts polling `short_code` on the current tokio runtime
pub fn subscribe<S: StatsSource>(source: S, short_code: impl Into<String>, config: PollerConfig) -> Subscription {
    let (updates_tx, updates) = mpsc::channel(16);
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(poll_loop(source, short_code.into(), config, updates_tx, stop_rx));

    Subscription {
        updates,
        stop_tx: Some(stop_tx),
        task,
    }
}

async fn poll_loop<S: StatsSource>(
    source: S,
    short_code: String,
    config: PollerConfig,
    updates: mpsc::Sender<ScanUpdate>,
    mut stop_rx: oneshot::Receiver<()>,
) -> PollOutcome {
    let mut ticker = tokio::time::interval(config.interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_count = None;
    let mut failures = 0;

    loop {
        tokio::select! {
            _ = &mut stop_rx => return PollOutcome::Cancelled,
            _ = ticker.tick() => {}
        }

        // redb reads block, keep them off the runtime workers
        let fetched = {
            let source = source.clone();
            let code = short_code.clone();
            tokio::task::spawn_blocking(move || source.fetch_stats(&code)).await
        };
        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                failures += 1;
                warn!(code = %short_code, failures, error = %err, "stats poll task failed");
                if failures >= config.max_failures {
                    return PollOutcome::GaveUp { failures };
                }
                continue;
            }
        };

        match fetched {
            Ok(record) => {
                failures = 0;
                if last_count == Some(record.scan_count) {
                    continue;
                }
                last_count = Some(record.scan_count);

                let update = ScanUpdate {
                    scan_count: record.scan_count,
                    last_scanned: record.last_scanned,
                };
                tokio::select! {
                    sent = updates.send(update) => {
                        if sent.is_err() {
                            return PollOutcome::Cancelled;
                        }
                    }
                    _ = &mut stop_rx => return PollOutcome::Cancelled,
                }
            }
            Err(LedgerError::NotFound(_)) => {
                debug!(code = %short_code, "code deleted, poller stopping");
                return PollOutcome::Deleted;
            }
            Err(err) => {
                failures += 1;
                warn!(code = %short_code, failures, error = %err, "stats poll failed");
                if failures >= config.max_failures {
                    return PollOutcome::GaveUp { failures };
                }
            }
        }
    }
}
