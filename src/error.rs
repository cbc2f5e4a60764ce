//! Error types for the metrics publisher.
//!

use crate::config::ConfigurationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Stats snapshot unavailable: {0}")]
    SnapshotUnavailable(String),
    #[error("Sink transport error for batch {batch_index} in namespace {namespace}: {source}")]
    SinkTransport {
        batch_index: usize,
        namespace: String,
        #[source]
        source: SinkError,
    },
    #[error(
        "{failed} of {attempted} metric batches failed to publish; first failure: {first_failure}"
    )]
    PartialPublish {
        failed: usize,
        attempted: usize,
        first_failure: String,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl MetricsError {
    /// Whether the failure only affected the sink side of a cycle.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MetricsError::SinkTransport { .. } | MetricsError::PartialPublish { .. }
        )
    }
}

/// Error returned by a [`MetricsSink`](crate::sink::MetricsSink) for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request throttled: {0}")]
    Throttled(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Sink closed")]
    Closed,
}

pub type MetricsResult<T> = anyhow::Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_classified() {
        let err = MetricsError::SinkTransport {
            batch_index: 2,
            namespace: "Sidekiq".to_string(),
            source: SinkError::Throttled("rate exceeded".to_string()),
        };
        assert!(err.is_transport());
        assert_eq!(
            err.to_string(),
            "Sink transport error for batch 2 in namespace Sidekiq: Request throttled: rate exceeded"
        );

        let err = MetricsError::SnapshotUnavailable("redis down".to_string());
        assert!(!err.is_transport());
    }

    #[test]
    fn configuration_errors_convert() {
        let err: MetricsError =
            ConfigurationError::invalid_value("max_batch_size", "0", "must be at least 1").into();
        assert!(matches!(err, MetricsError::Configuration(_)));
        assert!(err.to_string().contains("max_batch_size"));
    }
}
