//! # Metrics Publisher
//!
//! Runs one publish cycle: capture the cycle timestamp, take one stats
//! snapshot, look up each queue's latency, transform the snapshot into metric
//! points, then submit them to the sink in batches.
//!
//! A snapshot or latency failure abandons the cycle before anything is sent.
//! A sink failure only loses its own batch; the error is returned once every
//! batch has been attempted.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::batcher::submit_in_batches;
use crate::config::MetricsConfig;
use crate::error::{MetricsError, MetricsResult};
use crate::logging::log_publish_cycle;
use crate::models::StatsSnapshot;
use crate::sink::MetricsSink;
use crate::stats::{QueueLatencyLookup, StatsProvider};
use crate::transform::{build_metric_points, TransformContext};

/// Summary of a successful publish cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub timestamp: DateTime<Utc>,
    pub point_count: usize,
    pub batch_count: usize,
}

/// Publishes cluster statistics to a metrics sink
pub struct Publisher {
    id: Uuid,
    config: MetricsConfig,
    sink: Arc<dyn MetricsSink>,
    stats: Arc<dyn StatsProvider>,
    latency: Arc<dyn QueueLatencyLookup>,
    /// Serializes cycles so at most one is in flight per publisher
    cycle_lock: Mutex<()>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("id", &self.id)
            .field("namespace", &self.config.namespace)
            .field("dimensions", &self.config.dimensions)
            .field("max_batch_size", &self.config.max_batch_size)
            .finish()
    }
}

impl Publisher {
    /// Create a publisher, validating `config` first
    pub fn new(
        config: MetricsConfig,
        sink: Arc<dyn MetricsSink>,
        stats: Arc<dyn StatsProvider>,
        latency: Arc<dyn QueueLatencyLookup>,
    ) -> MetricsResult<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        info!(
            publisher_id = %id,
            namespace = %config.namespace,
            dimension_count = config.dimensions.len(),
            max_batch_size = config.max_batch_size,
            "Creating metrics publisher"
        );

        Ok(Self {
            id,
            config,
            sink,
            stats,
            latency,
            cycle_lock: Mutex::new(()),
        })
    }

    /// Create a publisher from one object serving both snapshots and latencies
    pub fn with_provider<P>(
        config: MetricsConfig,
        sink: Arc<dyn MetricsSink>,
        provider: Arc<P>,
    ) -> MetricsResult<Self>
    where
        P: StatsProvider + QueueLatencyLookup + 'static,
    {
        let stats: Arc<dyn StatsProvider> = provider.clone();
        let latency: Arc<dyn QueueLatencyLookup> = provider;
        Self::new(config, sink, stats, latency)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Run one publish cycle stamped with the current time
    pub async fn publish(&self) -> MetricsResult<PublishReport> {
        self.publish_at(Utc::now()).await
    }

    /// Run one publish cycle stamped with `timestamp`
    #[instrument(skip(self), fields(publisher_id = %self.id))]
    pub async fn publish_at(&self, timestamp: DateTime<Utc>) -> MetricsResult<PublishReport> {
        let _cycle = self.cycle_lock.lock().await;
        let started = Instant::now();

        let snapshot = self
            .stats
            .snapshot()
            .await
            .map_err(|e| MetricsError::SnapshotUnavailable(e.to_string()))?;
        let latencies = self.queue_latencies(&snapshot).await?;

        let context = TransformContext {
            timestamp,
            global_dimensions: &self.config.dimensions,
            process_metrics: self.config.process_metrics,
        };
        let points = build_metric_points(&snapshot, &latencies, &context);
        let point_count = points.len();

        debug!(
            publisher_id = %self.id,
            point_count,
            queue_count = snapshot.queues.len(),
            busy = snapshot.busy(),
            capacity = snapshot.capacity(),
            "Built metric points from stats snapshot"
        );

        let submission = submit_in_batches(
            self.sink.as_ref(),
            &self.config.namespace,
            points,
            self.config.max_batch_size,
        )
        .await;

        log_publish_cycle(
            &self.id,
            &self.config.namespace,
            point_count,
            submission.attempted,
            submission.failures.len(),
            started.elapsed().as_millis() as u64,
        );

        let attempted = submission.attempted;
        let mut failures = submission.failures;
        match failures.len() {
            0 => Ok(PublishReport {
                timestamp,
                point_count,
                batch_count: attempted,
            }),
            1 => {
                let (batch_index, source) = failures.remove(0);
                Err(MetricsError::SinkTransport {
                    batch_index,
                    namespace: self.config.namespace.clone(),
                    source,
                })
            }
            failed => {
                let (batch_index, error) = &failures[0];
                Err(MetricsError::PartialPublish {
                    failed,
                    attempted,
                    first_failure: format!("batch {batch_index}: {error}"),
                })
            }
        }
    }

    /// Release sink resources
    pub async fn close(&self) -> MetricsResult<()> {
        self.sink
            .close()
            .await
            .map_err(|source| MetricsError::SinkTransport {
                batch_index: 0,
                namespace: self.config.namespace.clone(),
                source,
            })
    }

    /// One latency lookup per distinct queue; any failure abandons the cycle
    async fn queue_latencies(
        &self,
        snapshot: &StatsSnapshot,
    ) -> MetricsResult<BTreeMap<String, f64>> {
        let mut latencies = BTreeMap::new();
        for queue in snapshot.queues.keys() {
            let latency = self.latency.latency(queue).await.map_err(|e| {
                MetricsError::SnapshotUnavailable(format!("latency for queue {queue}: {e}"))
            })?;
            latencies.insert(queue.clone(), latency);
        }
        Ok(latencies)
    }
}
