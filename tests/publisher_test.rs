//! Publisher Tests
//!
//! End-to-end publish cycles against in-memory stats and sink collaborators.

mod common;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use common::{build_publisher, find_point, production_config, production_dimensions};
use sidekiq_cloudwatch_metrics::test_helpers::{
    many_queues_snapshot, sample_snapshot, RecordingSink, StaticStatsProvider,
};
use sidekiq_cloudwatch_metrics::{
    Dimension, MetricPoint, MetricValue, MetricsError, StandardUnit, StatsSnapshot,
};

fn queue_dimensions(queue: &str) -> Vec<Dimension> {
    let mut dims = vec![Dimension::new("QueueName", queue)];
    dims.extend(production_dimensions());
    dims
}

#[tokio::test]
async fn publishes_full_metric_set_in_one_call() {
    let sink = Arc::new(RecordingSink::new());
    let provider = Arc::new(StaticStatsProvider::new(sample_snapshot()).with_default_latency(1.23));
    let publisher = build_publisher(production_config(), &sink, &provider);
    let now = Utc::now();

    publisher.publish_at(now).await.expect("publish succeeds");

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].namespace, "Sidekiq");

    let global = production_dimensions();
    let count = |name: &str, value: u64| {
        MetricPoint::new(name, now, value, StandardUnit::Count, global.clone())
    };
    let mut expected = vec![
        count("ProcessedJobs", 123),
        count("FailedJobs", 456),
        count("EnqueuedJobs", 6),
        count("ScheduledJobs", 1),
        count("RetryJobs", 2),
        count("DeadJobs", 3),
        count("Workers", 10),
        count("Processes", 5),
        count("Capacity", 30),
        MetricPoint::new("Utilization", now, 30.0, StandardUnit::Percent, global.clone()),
        MetricPoint::new("DefaultQueueLatency", now, 1.23, StandardUnit::Seconds, global.clone()),
    ];
    for (queue, size) in [("foo", 1u64), ("bar", 2), ("baz", 3)] {
        expected.push(MetricPoint::new(
            "QueueSize",
            now,
            size,
            StandardUnit::Count,
            queue_dimensions(queue),
        ));
        expected.push(MetricPoint::new(
            "QueueLatency",
            now,
            1.23,
            StandardUnit::Seconds,
            queue_dimensions(queue),
        ));
    }

    let actual = &calls[0].points;
    assert_eq!(actual.len(), 17);
    for point in &expected {
        assert!(actual.contains(point), "missing point {point:?}");
    }
}

#[tokio::test]
async fn derived_metrics_follow_process_set() {
    let sink = Arc::new(RecordingSink::new());
    let provider = Arc::new(StaticStatsProvider::new(sample_snapshot()));
    let publisher = build_publisher(production_config(), &sink, &provider);

    publisher.publish().await.unwrap();

    let points = sink.accepted_points();
    assert_eq!(
        find_point(&points, "Capacity", None).value,
        MetricValue::Integer(30)
    );
    assert_eq!(
        find_point(&points, "Utilization", None).value,
        MetricValue::Float(30.0)
    );
}

#[tokio::test]
async fn lots_of_queues_are_sent_in_batches_of_twenty() {
    let sink = Arc::new(RecordingSink::new());
    let provider = Arc::new(StaticStatsProvider::new(many_queues_snapshot(30)).with_default_latency(1.23));
    let publisher = build_publisher(production_config(), &sink, &provider);

    let report = publisher.publish().await.unwrap();

    assert_eq!(report.point_count, 71);
    assert_eq!(report.batch_count, 4);
    assert_eq!(sink.call_count(), 4);
    assert!(sink.calls().iter().all(|c| c.points.len() <= 20));
    assert_eq!(sink.accepted_points().len(), 71);
    assert_eq!(provider.latency_calls(), 30);
}

#[tokio::test]
async fn every_point_in_a_cycle_shares_one_timestamp() {
    let sink = Arc::new(RecordingSink::new());
    let provider = Arc::new(StaticStatsProvider::new(many_queues_snapshot(12)));
    let publisher = build_publisher(production_config(), &sink, &provider);

    let report = publisher.publish().await.unwrap();

    let points = sink.accepted_points();
    assert!(sink.call_count() > 1);
    assert!(points.iter().all(|p| p.timestamp == report.timestamp));
}

#[tokio::test]
async fn no_processes_omits_utilization() {
    let sink = Arc::new(RecordingSink::new());
    let snapshot = StatsSnapshot {
        process_set: Vec::new(),
        ..sample_snapshot()
    };
    let provider = Arc::new(StaticStatsProvider::new(snapshot));
    let publisher = build_publisher(production_config(), &sink, &provider);

    let report = publisher.publish().await.unwrap();

    let points = sink.accepted_points();
    assert_eq!(report.point_count, 16);
    assert!(points.iter().all(|p| p.name != "Utilization"));
    assert_eq!(
        find_point(&points, "Capacity", None).value,
        MetricValue::Integer(0)
    );
}

#[tokio::test]
async fn single_batch_failure_is_isolated_and_reported() {
    let sink = Arc::new(RecordingSink::new().failing_on([1]));
    let provider = Arc::new(StaticStatsProvider::new(many_queues_snapshot(30)));
    let publisher = build_publisher(production_config(), &sink, &provider);

    let err = publisher.publish().await.unwrap_err();

    match err {
        MetricsError::SinkTransport {
            batch_index,
            namespace,
            ..
        } => {
            assert_eq!(batch_index, 1);
            assert_eq!(namespace, "Sidekiq");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Remaining batches were still attempted, none twice
    assert_eq!(sink.call_count(), 4);
    assert_eq!(sink.accepted_points().len(), 51);
}

#[tokio::test]
async fn several_batch_failures_are_summarized() {
    let sink = Arc::new(RecordingSink::new().failing_on([0, 3]));
    let provider = Arc::new(StaticStatsProvider::new(many_queues_snapshot(30)));
    let publisher = build_publisher(production_config(), &sink, &provider);

    let err = publisher.publish().await.unwrap_err();

    assert!(err.is_transport());
    match err {
        MetricsError::PartialPublish {
            failed, attempted, ..
        } => {
            assert_eq!(failed, 2);
            assert_eq!(attempted, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn snapshot_failure_abandons_the_cycle() {
    let sink = Arc::new(RecordingSink::new());
    let provider = Arc::new(StaticStatsProvider::unavailable("redis timeout"));
    let publisher = build_publisher(production_config(), &sink, &provider);

    let err = publisher.publish().await.unwrap_err();

    assert!(matches!(err, MetricsError::SnapshotUnavailable(_)));
    assert_eq!(sink.call_count(), 0);

    // The next cycle succeeds once stats are back
    provider.set_snapshot(sample_snapshot());
    publisher.publish().await.unwrap();
    assert_eq!(sink.call_count(), 1);
}

#[tokio::test]
async fn concurrent_publish_calls_never_overlap() {
    let sink = Arc::new(RecordingSink::new().with_delay(Duration::from_millis(20)));
    let provider = Arc::new(StaticStatsProvider::new(many_queues_snapshot(30)));
    let publisher = Arc::new(build_publisher(production_config(), &sink, &provider));

    let first = tokio::spawn({
        let publisher = Arc::clone(&publisher);
        async move { publisher.publish().await }
    });
    let second = tokio::spawn({
        let publisher = Arc::clone(&publisher);
        async move { publisher.publish().await }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(sink.call_count(), 8);
    assert_eq!(sink.max_in_flight(), 1);
}

#[tokio::test]
async fn process_metrics_add_per_host_utilization() {
    let sink = Arc::new(RecordingSink::new());
    let provider = Arc::new(StaticStatsProvider::new(sample_snapshot()));
    let config = production_config().with_process_metrics(true);
    let publisher = build_publisher(config, &sink, &provider);

    let report = publisher.publish().await.unwrap();

    assert_eq!(report.point_count, 19);
    let per_host: Vec<MetricPoint> = sink
        .accepted_points()
        .into_iter()
        .filter(|p| p.dimension("Hostname").is_some())
        .collect();
    assert_eq!(per_host.len(), 2);
    assert_eq!(
        per_host[0].dimensions,
        vec![
            Dimension::new("Hostname", "worker-1"),
            Dimension::new("Environment", "Production")
        ]
    );
}
