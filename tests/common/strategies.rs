use proptest::prelude::*;

use sidekiq_cloudwatch_metrics::{Dimension, ProcessStats, StatsSnapshot};

/// Strategy for generating queue names
pub fn queue_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,19}"
}

/// Strategy for generating worker processes, some of them idle with no concurrency
pub fn process_strategy() -> impl Strategy<Value = ProcessStats> {
    ("[a-z]{3,8}-[0-9]{1,3}", 0u64..50)
        .prop_flat_map(|(hostname, concurrency)| {
            (Just(hostname), 0..=concurrency, Just(concurrency))
        })
        .prop_map(|(hostname, busy, concurrency)| ProcessStats::new(hostname, busy, concurrency))
}

/// Strategy for generating global dimension sets with distinct names
pub fn global_dimensions_strategy() -> impl Strategy<Value = Vec<Dimension>> {
    prop::collection::btree_map("[A-Z][a-zA-Z]{2,11}", "[a-zA-Z0-9-]{1,16}", 0..4).prop_map(
        |dims| {
            dims.into_iter()
                .filter(|(name, _)| name != "QueueName" && name != "Hostname")
                .map(|(name, value)| Dimension::new(name, value))
                .collect()
        },
    )
}

/// Strategy for generating stats snapshots with up to 60 queues
pub fn snapshot_strategy() -> impl Strategy<Value = StatsSnapshot> {
    (
        prop::collection::btree_map(queue_name_strategy(), 0u64..100_000, 0..60),
        prop::collection::vec(process_strategy(), 0..8),
        any::<u32>(),
        0.0f64..3600.0,
    )
        .prop_map(|(queues, process_set, processed, latency)| StatsSnapshot {
            processed: u64::from(processed),
            enqueued: queues.values().sum(),
            queues,
            processes: process_set.len() as u64,
            process_set,
            default_queue_latency: latency,
            ..StatsSnapshot::default()
        })
}
