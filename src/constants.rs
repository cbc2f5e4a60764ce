//! # Metric Names and Backend Limits
//!
//! Names of every metric the publisher emits and the limits imposed by the
//! metrics backend.

/// Namespace batches are tagged with unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "Sidekiq";

/// Metric names emitted by the snapshot transformer
pub mod metrics {
    // Global counters
    pub const PROCESSED_JOBS: &str = "ProcessedJobs";
    pub const FAILED_JOBS: &str = "FailedJobs";
    pub const ENQUEUED_JOBS: &str = "EnqueuedJobs";
    pub const SCHEDULED_JOBS: &str = "ScheduledJobs";
    pub const RETRY_JOBS: &str = "RetryJobs";
    pub const DEAD_JOBS: &str = "DeadJobs";
    pub const WORKERS: &str = "Workers";
    pub const PROCESSES: &str = "Processes";

    // Derived
    pub const CAPACITY: &str = "Capacity";
    pub const UTILIZATION: &str = "Utilization";
    pub const DEFAULT_QUEUE_LATENCY: &str = "DefaultQueueLatency";

    // Per queue
    pub const QUEUE_SIZE: &str = "QueueSize";
    pub const QUEUE_LATENCY: &str = "QueueLatency";
}

/// Dimension names attached by the publisher itself
pub mod dimensions {
    pub const QUEUE_NAME: &str = "QueueName";
    pub const HOSTNAME: &str = "Hostname";

    /// Names a global dimension may not use
    pub const RESERVED: [&str; 2] = [QUEUE_NAME, HOSTNAME];
}

/// Limits imposed by the metrics backend
pub mod limits {
    /// Largest batch a single put call accepts
    pub const MAX_BATCH_SIZE: usize = 1000;
    /// Dimensions allowed on one metric point
    pub const MAX_DIMENSIONS: usize = 30;
    pub const MAX_NAME_LENGTH: usize = 255;
    pub const MAX_DIMENSION_VALUE_LENGTH: usize = 1024;
    pub const RESERVED_NAMESPACE_PREFIX: &str = "AWS/";
}
