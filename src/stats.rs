//! # Cluster Statistics Sources
//!
//! The job-processing cluster is only seen through these two traits. Hosts
//! implement them against their queue store; the publisher calls
//! [`StatsProvider::snapshot`] once per cycle and
//! [`QueueLatencyLookup::latency`] once per distinct queue in that snapshot.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::StatsSnapshot;

/// Failure reading cluster statistics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("Stats backend unavailable: {0}")]
    Unavailable(String),
    #[error("Unknown queue: {0}")]
    UnknownQueue(String),
}

/// Supplies a single consistent point-in-time view of cluster counters
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn snapshot(&self) -> Result<StatsSnapshot, StatsError>;
}

/// Looks up the current latency of one queue, in seconds
#[async_trait]
pub trait QueueLatencyLookup: Send + Sync {
    async fn latency(&self, queue: &str) -> Result<f64, StatsError>;
}
