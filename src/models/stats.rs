//! # Cluster Statistics
//!
//! The point-in-time view of the job-processing cluster that a
//! [`StatsProvider`](crate::stats::StatsProvider) hands to the publisher.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One worker process as reported by the process registry
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ProcessStats {
    pub hostname: String,
    /// Jobs currently executing in this process
    pub busy: u64,
    /// Configured worker threads in this process
    pub concurrency: u64,
}

impl ProcessStats {
    pub fn new(hostname: impl Into<String>, busy: u64, concurrency: u64) -> Self {
        Self {
            hostname: hostname.into(),
            busy,
            concurrency,
        }
    }

    /// Busy share of this process in percent, `None` when it has no concurrency
    pub fn utilization(&self) -> Option<f64> {
        if self.concurrency == 0 {
            return None;
        }
        Some(100.0 * self.busy as f64 / self.concurrency as f64)
    }
}

/// Consistent snapshot of cluster counters
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub failed: u64,
    pub enqueued: u64,
    pub scheduled: u64,
    pub retry: u64,
    pub dead: u64,
    /// Queue name to current queue size
    pub queues: BTreeMap<String, u64>,
    pub workers: u64,
    pub processes: u64,
    /// Latency of the `default` queue in seconds
    pub default_queue_latency: f64,
    /// Live process records used for capacity and utilization
    pub process_set: Vec<ProcessStats>,
}

impl StatsSnapshot {
    /// Total configured concurrency across all known processes
    pub fn capacity(&self) -> u64 {
        self.process_set.iter().map(|p| p.concurrency).sum()
    }

    /// Jobs currently executing across all known processes
    pub fn busy(&self) -> u64 {
        self.process_set.iter().map(|p| p.busy).sum()
    }

    /// Mean of the per-process busy percentages.
    ///
    /// Processes without concurrency are left out; `None` when capacity is zero.
    pub fn utilization(&self) -> Option<f64> {
        let per_process: Vec<f64> = self
            .process_set
            .iter()
            .filter_map(ProcessStats::utilization)
            .collect();
        if per_process.is_empty() {
            return None;
        }
        Some(per_process.iter().sum::<f64>() / per_process.len() as f64)
    }
}
