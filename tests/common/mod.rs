//! Shared fixtures for the integration tests.

#![allow(dead_code)]

pub mod strategies;

use std::sync::Arc;
use std::time::Duration;

use sidekiq_cloudwatch_metrics::test_helpers::{RecordingSink, StaticStatsProvider};
use sidekiq_cloudwatch_metrics::{Dimension, MetricPoint, MetricsConfig, Publisher};

/// `Environment=Production`, the global dimension used across the suite
pub fn production_dimensions() -> Vec<Dimension> {
    vec![Dimension::new("Environment", "Production")]
}

pub fn production_config() -> MetricsConfig {
    MetricsConfig::default().with_dimension("Environment", "Production")
}

/// Production config with a short shutdown timeout for loop tests
pub fn quick_shutdown_config(shutdown_timeout: Duration) -> MetricsConfig {
    let mut config = production_config();
    config.shutdown_timeout_ms = shutdown_timeout.as_millis() as u64;
    config
}

pub fn build_publisher(
    config: MetricsConfig,
    sink: &Arc<RecordingSink>,
    provider: &Arc<StaticStatsProvider>,
) -> Publisher {
    Publisher::with_provider(config, sink.clone(), provider.clone()).expect("valid publisher")
}

/// Find the single point named `name` whose `QueueName` dimension matches `queue`
pub fn find_point<'a>(
    points: &'a [MetricPoint],
    name: &str,
    queue: Option<&str>,
) -> &'a MetricPoint {
    let matches: Vec<&MetricPoint> = points
        .iter()
        .filter(|p| p.name == name && p.dimension("QueueName") == queue)
        .collect();
    assert_eq!(
        matches.len(),
        1,
        "expected exactly one {name} point for queue {queue:?}, found {}",
        matches.len()
    );
    matches[0]
}
