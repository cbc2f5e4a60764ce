#![allow(clippy::doc_markdown)] // Allow technical terms like CloudWatch, Sidekiq in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Sidekiq CloudWatch Metrics
//!
//! Periodically samples the state of a background job-processing cluster and
//! publishes it as time-series metric points to a CloudWatch-style monitoring
//! backend.
//!
//! ## Overview
//!
//! The crate runs embedded in each worker process and follows that process's
//! lifecycle: it is armed when the process is a server, starts a reporting
//! loop at `startup`, and stops at `quiet` / `shutdown`. Each cycle takes one
//! stats snapshot, turns it into metric points and sends them in batches.
//!
//! ## Module Organization
//!
//! - [`models`] - Metric points, batches and the stats snapshot
//! - [`transform`] - Snapshot to metric point mapping
//! - [`batcher`] - Batch partitioning and submission
//! - [`publisher`] - One publish cycle
//! - [`scheduler`] - Periodic, cancellable publish loop
//! - [`lifecycle`] - Lifecycle events and hook registration
//! - [`controller`] - Activation and lifecycle wiring
//! - [`stats`] / [`sink`] - Collaborator interfaces
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sidekiq_cloudwatch_metrics::{
//!     CloudWatchMetrics, LifecycleEvent, LifecycleRegistry, MetricsConfig, TracingSink,
//! };
//! use sidekiq_cloudwatch_metrics::test_helpers::{sample_snapshot, StaticStatsProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let host = LifecycleRegistry::server();
//! let provider = Arc::new(StaticStatsProvider::new(sample_snapshot()));
//!
//! let metrics = CloudWatchMetrics::with_collaborators(
//!     MetricsConfig::default().with_dimension("Environment", "Production"),
//!     Arc::new(TracingSink),
//!     provider.clone(),
//!     provider,
//! )?;
//! metrics.enable(&host);
//!
//! host.fire(LifecycleEvent::Startup).await;
//! // ... process runs, metrics are published every 60 seconds ...
//! host.fire(LifecycleEvent::Shutdown).await;
//! # Ok(())
//! # }
//! ```

pub mod batcher;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod publisher;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod test_helpers;
pub mod transform;

pub use config::{ConfigLoader, ConfigurationError, MetricsConfig};
pub use controller::{CloudWatchMetrics, ControllerState, PublisherFactory};
pub use error::{MetricsError, MetricsResult, SinkError};
pub use lifecycle::{
    LifecycleEvent, LifecycleHook, LifecycleNotifier, LifecycleRegistry, ProcessHost,
};
pub use models::{
    Dimension, MetricBatch, MetricPoint, MetricValue, ProcessStats, StandardUnit, StatsSnapshot,
};
pub use publisher::{PublishReport, Publisher};
pub use scheduler::PublishLoop;
pub use sink::{MetricsSink, TracingSink};
pub use stats::{QueueLatencyLookup, StatsError, StatsProvider};

use std::sync::Arc;

/// Activate metrics publishing for `host`.
///
/// Validates `config`, then registers lifecycle hooks if `host` is a server
/// process that has not been activated yet. A repeated call for the same host
/// registers nothing and returns a `Disabled` controller.
pub fn enable(
    host: &dyn ProcessHost,
    config: MetricsConfig,
    sink: Arc<dyn MetricsSink>,
    stats: Arc<dyn StatsProvider>,
    latency: Arc<dyn QueueLatencyLookup>,
) -> MetricsResult<CloudWatchMetrics> {
    let metrics = CloudWatchMetrics::with_collaborators(config, sink, stats, latency)?;
    metrics.enable(host);
    Ok(metrics)
}
