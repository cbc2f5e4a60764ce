//! # Metrics Sink
//!
//! The monitoring backend is only seen through [`MetricsSink`]. One call
//! carries one batch of at most `max_batch_size` points tagged with a
//! namespace.

use async_trait::async_trait;
use tracing::info;

use crate::error::SinkError;
use crate::models::MetricPoint;

/// Accepts batches of metric points for a namespace
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Submit one batch. The publisher never retries a failed batch within a cycle.
    async fn put_metric_batch(&self, namespace: &str, points: &[MetricPoint])
        -> Result<(), SinkError>;

    /// Release transport resources at process shutdown
    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that writes each batch to the log as backend-shaped JSON.
///
/// Useful where no monitoring backend is reachable, e.g. local development.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

#[async_trait]
impl MetricsSink for TracingSink {
    async fn put_metric_batch(
        &self,
        namespace: &str,
        points: &[MetricPoint],
    ) -> Result<(), SinkError> {
        let metric_data = serde_json::to_string(points)
            .map_err(|e| SinkError::Rejected(format!("unserializable batch: {e}")))?;

        info!(
            namespace = %namespace,
            point_count = points.len(),
            metric_data = %metric_data,
            "📈 PUT_METRIC_DATA"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StandardUnit;
    use chrono::Utc;

    #[tokio::test]
    async fn tracing_sink_accepts_batches() {
        let sink = TracingSink;
        let points = vec![MetricPoint::new(
            "Workers",
            Utc::now(),
            3u64,
            StandardUnit::Count,
            vec![],
        )];

        tokio_test::assert_ok!(sink.put_metric_batch("Sidekiq", &points).await);
        tokio_test::assert_ok!(sink.close().await);
    }
}
