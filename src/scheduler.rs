//! Periodic publish loop
//!
//! A dedicated tokio task that calls [`Publisher::publish`] on a fixed
//! interval, independent of the job-processing worker pool. The first cycle
//! runs immediately. Cycles run back to back inside the task, so a slow cycle
//! delays the next tick but never overlaps it.
//!
//! Stopping signals the task, waits up to the shutdown timeout for an
//! in-flight cycle to finish, then aborts the task (dropping any in-flight
//! sink call).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{MetricsError, MetricsResult};
use crate::publisher::Publisher;

/// Shortest period between two publish cycles
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Background loop driving one [`Publisher`]
pub struct PublishLoop {
    loop_id: Uuid,
    publisher: Arc<Publisher>,
    interval: Duration,
    shutdown_timeout: Duration,
    cycles_completed: Arc<AtomicU64>,
    cycles_failed: Arc<AtomicU64>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PublishLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishLoop")
            .field("loop_id", &self.loop_id)
            .field("interval", &self.interval)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("is_running", &self.is_running())
            .finish()
    }
}

impl PublishLoop {
    /// Loop using the publisher's configured interval and shutdown timeout
    pub fn new(publisher: Arc<Publisher>) -> Self {
        let interval = publisher.config().interval();
        let shutdown_timeout = publisher.config().shutdown_timeout();
        Self::with_timing(publisher, interval, shutdown_timeout)
    }

    /// Loop with explicit timing; an interval below one second is raised to one second
    pub fn with_timing(
        publisher: Arc<Publisher>,
        interval: Duration,
        shutdown_timeout: Duration,
    ) -> Self {
        let interval = if interval < MIN_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "Publish interval below minimum, using {}s",
                MIN_INTERVAL.as_secs()
            );
            MIN_INTERVAL
        } else {
            interval
        };

        Self {
            loop_id: Uuid::new_v4(),
            publisher,
            interval,
            shutdown_timeout,
            cycles_completed: Arc::new(AtomicU64::new(0)),
            cycles_failed: Arc::new(AtomicU64::new(0)),
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Spawn the loop task; a second call while running is a no-op
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!(loop_id = %self.loop_id, "Publish loop already running");
            return;
        }

        info!(
            loop_id = %self.loop_id,
            publisher_id = %self.publisher.id(),
            interval_seconds = self.interval.as_secs_f64(),
            "Starting metrics publish loop"
        );

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let publisher = Arc::clone(&self.publisher);
        let period = self.interval;
        let loop_id = self.loop_id;
        let cycles_completed = Arc::clone(&self.cycles_completed);
        let cycles_failed = Arc::clone(&self.cycles_failed);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                debug!(loop_id = %loop_id, "Running metrics publish cycle");

                match publisher.publish().await {
                    Ok(report) => {
                        cycles_completed.fetch_add(1, Ordering::SeqCst);
                        debug!(
                            loop_id = %loop_id,
                            point_count = report.point_count,
                            batch_count = report.batch_count,
                            "Metrics publish cycle completed"
                        );
                    }
                    Err(e) => {
                        cycles_failed.fetch_add(1, Ordering::SeqCst);
                        error!(
                            loop_id = %loop_id,
                            error = %e,
                            "Metrics publish cycle failed"
                        );
                    }
                }
            }

            info!(loop_id = %loop_id, "Metrics publish loop stopped");
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.handle = Some(handle);
    }

    /// Stop the loop, waiting at most the shutdown timeout for an in-flight cycle
    pub async fn stop(&mut self) -> MetricsResult<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };

        info!(loop_id = %self.loop_id, "Stopping metrics publish loop");

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }

        match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!(
                    loop_id = %self.loop_id,
                    timeout_ms = self.shutdown_timeout.as_millis() as u64,
                    "In-flight publish cycle did not finish in time, aborting"
                );
                handle.abort();
                let _ = handle.await;
                Err(MetricsError::Timeout(format!(
                    "publish loop did not stop within {}ms",
                    self.shutdown_timeout.as_millis()
                )))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::SeqCst)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed.load(Ordering::SeqCst)
    }

    pub fn loop_id(&self) -> Uuid {
        self.loop_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for PublishLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
