//! # Test Helpers
//!
//! In-memory collaborators for exercising the publisher without a job cluster
//! or a monitoring backend. Used by the unit tests and the `tests/` suite, and
//! handy for hosts that want to smoke-test their wiring.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::SinkError;
use crate::models::{MetricPoint, ProcessStats, StatsSnapshot};
use crate::sink::MetricsSink;
use crate::stats::{QueueLatencyLookup, StatsError, StatsProvider};

/// Snapshot with three queues and two processes (capacity 30, utilization 30%)
pub fn sample_snapshot() -> StatsSnapshot {
    StatsSnapshot {
        processed: 123,
        failed: 456,
        enqueued: 6,
        scheduled: 1,
        retry: 2,
        dead: 3,
        queues: BTreeMap::from([
            ("foo".to_string(), 1),
            ("bar".to_string(), 2),
            ("baz".to_string(), 3),
        ]),
        workers: 10,
        processes: 5,
        default_queue_latency: 1.23,
        process_set: vec![
            ProcessStats::new("worker-1", 5, 10),
            ProcessStats::new("worker-2", 2, 20),
        ],
    }
}

/// Snapshot with `count` queues named `queue0..` sized by their index
pub fn many_queues_snapshot(count: u64) -> StatsSnapshot {
    StatsSnapshot {
        queues: (0..count).map(|i| (format!("queue{i}"), i)).collect(),
        ..sample_snapshot()
    }
}

/// Stats source returning a fixed snapshot and fixed queue latencies
#[derive(Debug)]
pub struct StaticStatsProvider {
    snapshot: Mutex<Result<StatsSnapshot, StatsError>>,
    latencies: HashMap<String, f64>,
    default_latency: f64,
    snapshot_calls: AtomicUsize,
    latency_calls: AtomicUsize,
}

impl StaticStatsProvider {
    pub fn new(snapshot: StatsSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Ok(snapshot)),
            latencies: HashMap::new(),
            default_latency: 0.0,
            snapshot_calls: AtomicUsize::new(0),
            latency_calls: AtomicUsize::new(0),
        }
    }

    /// Provider whose snapshot call always fails
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let provider = Self::new(StatsSnapshot::default());
        *provider.snapshot.lock() = Err(StatsError::Unavailable(reason.into()));
        provider
    }

    /// Latency reported for queues without an explicit entry
    pub fn with_default_latency(mut self, latency: f64) -> Self {
        self.default_latency = latency;
        self
    }

    pub fn with_latency(mut self, queue: impl Into<String>, latency: f64) -> Self {
        self.latencies.insert(queue.into(), latency);
        self
    }

    /// Replace the snapshot returned from now on
    pub fn set_snapshot(&self, snapshot: StatsSnapshot) {
        *self.snapshot.lock() = Ok(snapshot);
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn latency_calls(&self) -> usize {
        self.latency_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsProvider for StaticStatsProvider {
    async fn snapshot(&self) -> Result<StatsSnapshot, StatsError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.lock().clone()
    }
}

#[async_trait]
impl QueueLatencyLookup for StaticStatsProvider {
    async fn latency(&self, queue: &str) -> Result<f64, StatsError> {
        self.latency_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .latencies
            .get(queue)
            .copied()
            .unwrap_or(self.default_latency))
    }
}

/// One call received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub namespace: String,
    pub points: Vec<MetricPoint>,
    pub accepted: bool,
}

/// Sink that records every call, optionally failing or delaying some of them
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<RecordedBatch>>,
    failing_calls: HashSet<usize>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the calls with these zero-based indexes (counted across cycles)
    pub fn failing_on(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls.extend(calls);
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedBatch> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Points from accepted calls, in submission order
    pub fn accepted_points(&self) -> Vec<MetricPoint> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.accepted)
            .flat_map(|c| c.points.clone())
            .collect()
    }

    /// Highest number of calls that were ever running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn put_metric_batch(
        &self,
        namespace: &str,
        points: &[MetricPoint],
    ) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let accepted = {
            let mut calls = self.calls.lock();
            let accepted = !self.failing_calls.contains(&calls.len());
            calls.push(RecordedBatch {
                namespace: namespace.to_string(),
                points: points.to_vec(),
                accepted,
            });
            accepted
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if accepted {
            Ok(())
        } else {
            Err(SinkError::Network("simulated transport failure".to_string()))
        }
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
