//! # Batcher
//!
//! Splits a cycle's points into [`MetricBatch`]es and submits them to the
//! sink one call per batch. A failed batch is recorded and skipped; the
//! remaining batches are still attempted and nothing is resubmitted.

use tracing::{debug, warn};

use crate::error::SinkError;
use crate::models::{MetricBatch, MetricPoint};
use crate::sink::MetricsSink;

/// Outcome of submitting every batch of one cycle
#[derive(Debug, Default)]
pub struct BatchSubmission {
    /// Batches handed to the sink
    pub attempted: usize,
    /// Points in batches the sink accepted
    pub points_submitted: usize,
    /// Index and error of each rejected batch, in submission order
    pub failures: Vec<(usize, SinkError)>,
}

impl BatchSubmission {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Partition `points` and submit each batch in order
pub async fn submit_in_batches(
    sink: &dyn MetricsSink,
    namespace: &str,
    points: Vec<MetricPoint>,
    max_batch_size: usize,
) -> BatchSubmission {
    let batches = MetricBatch::partition(points, max_batch_size);
    let mut submission = BatchSubmission::default();

    for (batch_index, batch) in batches.iter().enumerate() {
        submission.attempted += 1;

        match sink.put_metric_batch(namespace, batch.points()).await {
            Ok(()) => {
                debug!(
                    namespace = %namespace,
                    batch_index,
                    point_count = batch.len(),
                    "Metric batch submitted"
                );
                submission.points_submitted += batch.len();
            }
            Err(e) => {
                warn!(
                    namespace = %namespace,
                    batch_index,
                    point_count = batch.len(),
                    error = %e,
                    "Metric batch rejected by sink"
                );
                submission.failures.push((batch_index, e));
            }
        }
    }

    submission
}
