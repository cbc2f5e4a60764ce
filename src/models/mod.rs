//! # Data Model
//!
//! Value objects produced and consumed by one publish cycle. Everything here is
//! created fresh per cycle and dropped after submission.

pub mod metric;
pub mod stats;

pub use metric::{Dimension, MetricBatch, MetricPoint, MetricValue, StandardUnit};
pub use stats::{ProcessStats, StatsSnapshot};
