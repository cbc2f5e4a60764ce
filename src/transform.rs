//! # Snapshot Transformer
//!
//! Pure mapping from one [`StatsSnapshot`] to the ordered list of metric
//! points for a cycle. Emission order is fixed:
//!
//! 1. the global set (`ProcessedJobs` .. `DefaultQueueLatency`)
//! 2. per-process `Utilization`, when process metrics are enabled
//! 3. `QueueSize` / `QueueLatency` pairs in queue-name order
//!
//! Every point gets the cycle timestamp and ends with the global dimensions.
//! `Utilization` is left out when capacity is zero.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

use crate::constants::{dimensions, metrics};
use crate::models::{Dimension, MetricPoint, MetricValue, StandardUnit, StatsSnapshot};

/// Per-cycle inputs the transformer needs besides the snapshot
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub timestamp: DateTime<Utc>,
    pub global_dimensions: &'a [Dimension],
    pub process_metrics: bool,
}

/// Build every metric point for one cycle.
///
/// `queue_latencies` must hold an entry for each queue in `snapshot.queues`.
/// A missing entry is a caller bug: debug builds panic, release builds log a
/// warning and report that queue with zero latency.
pub fn build_metric_points(
    snapshot: &StatsSnapshot,
    queue_latencies: &BTreeMap<String, f64>,
    context: &TransformContext<'_>,
) -> Vec<MetricPoint> {
    let mut points = Vec::with_capacity(expected_point_count(snapshot, context.process_metrics));

    let global = |name: &str, value: MetricValue, unit: StandardUnit| {
        MetricPoint::new(
            name,
            context.timestamp,
            value,
            unit,
            context.global_dimensions.to_vec(),
        )
    };

    let counters = [
        (metrics::PROCESSED_JOBS, snapshot.processed),
        (metrics::FAILED_JOBS, snapshot.failed),
        (metrics::ENQUEUED_JOBS, snapshot.enqueued),
        (metrics::SCHEDULED_JOBS, snapshot.scheduled),
        (metrics::RETRY_JOBS, snapshot.retry),
        (metrics::DEAD_JOBS, snapshot.dead),
        (metrics::WORKERS, snapshot.workers),
        (metrics::PROCESSES, snapshot.processes),
        (metrics::CAPACITY, snapshot.capacity()),
    ];
    for (name, value) in counters {
        points.push(global(name, value.into(), StandardUnit::Count));
    }

    if let Some(utilization) = snapshot.utilization() {
        points.push(global(
            metrics::UTILIZATION,
            utilization.into(),
            StandardUnit::Percent,
        ));
    }

    points.push(global(
        metrics::DEFAULT_QUEUE_LATENCY,
        snapshot.default_queue_latency.into(),
        StandardUnit::Seconds,
    ));

    if context.process_metrics {
        for process in &snapshot.process_set {
            if let Some(utilization) = process.utilization() {
                points.push(MetricPoint::new(
                    metrics::UTILIZATION,
                    context.timestamp,
                    utilization,
                    StandardUnit::Percent,
                    scoped_dimensions(dimensions::HOSTNAME, &process.hostname, context),
                ));
            }
        }
    }

    for (queue, size) in &snapshot.queues {
        debug_assert!(
            queue_latencies.contains_key(queue),
            "no latency supplied for queue {queue}"
        );
        let latency = queue_latencies.get(queue).copied().unwrap_or_else(|| {
            warn!(queue = %queue, "No latency supplied for queue, reporting zero");
            0.0
        });

        points.push(MetricPoint::new(
            metrics::QUEUE_SIZE,
            context.timestamp,
            *size,
            StandardUnit::Count,
            scoped_dimensions(dimensions::QUEUE_NAME, queue, context),
        ));
        points.push(MetricPoint::new(
            metrics::QUEUE_LATENCY,
            context.timestamp,
            latency,
            StandardUnit::Seconds,
            scoped_dimensions(dimensions::QUEUE_NAME, queue, context),
        ));
    }

    points
}

/// Number of points [`build_metric_points`] produces for `snapshot`
pub fn expected_point_count(snapshot: &StatsSnapshot, process_metrics: bool) -> usize {
    let utilization = usize::from(snapshot.utilization().is_some());
    let per_process = if process_metrics {
        snapshot
            .process_set
            .iter()
            .filter(|p| p.concurrency > 0)
            .count()
    } else {
        0
    };

    10 + utilization + per_process + 2 * snapshot.queues.len()
}

/// `name=value` followed by the global dimensions
fn scoped_dimensions(name: &str, value: &str, context: &TransformContext<'_>) -> Vec<Dimension> {
    let mut dims = Vec::with_capacity(context.global_dimensions.len() + 1);
    dims.push(Dimension::new(name, value));
    dims.extend_from_slice(context.global_dimensions);
    dims
}
