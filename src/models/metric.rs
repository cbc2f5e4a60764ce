//! # Metric Points and Batches
//!
//! Value objects sent to the metrics backend. Field names serialize in the
//! backend's PascalCase wire shape (`MetricName`, `Timestamp`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named tag attached to a metric point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Dimension {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Value", alias = "value")]
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Units understood by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum StandardUnit {
    Count,
    Percent,
    Seconds,
}

impl StandardUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardUnit::Count => "Count",
            StandardUnit::Percent => "Percent",
            StandardUnit::Seconds => "Seconds",
        }
    }
}

impl fmt::Display for StandardUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric value of a metric point
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(u64),
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Integer(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

/// One timestamped, dimensioned measurement
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricPoint {
    #[serde(rename = "MetricName")]
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub value: MetricValue,
    pub unit: StandardUnit,
    pub dimensions: Vec<Dimension>,
}

impl MetricPoint {
    pub fn new(
        name: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: impl Into<MetricValue>,
        unit: StandardUnit,
        dimensions: Vec<Dimension>,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp,
            value: value.into(),
            unit,
            dimensions,
        }
    }

    /// Value of the named dimension, if the point carries it
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// An ordered group of points submitted in a single sink call.
///
/// Never longer than the `max_batch_size` it was partitioned with.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricBatch {
    points: Vec<MetricPoint>,
}

impl MetricBatch {
    /// Split `points` into consecutive batches of at most `max_batch_size`.
    ///
    /// Produces `ceil(N / max_batch_size)` batches; only the last may be short.
    /// A `max_batch_size` of zero is treated as one.
    pub fn partition(points: Vec<MetricPoint>, max_batch_size: usize) -> Vec<MetricBatch> {
        let size = max_batch_size.max(1);
        let mut batches = Vec::with_capacity(points.len().div_ceil(size));
        let mut iter = points.into_iter().peekable();

        while iter.peek().is_some() {
            let chunk: Vec<MetricPoint> = iter.by_ref().take(size).collect();
            batches.push(MetricBatch { points: chunk });
        }

        batches
    }

    pub fn points(&self) -> &[MetricPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<MetricPoint> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<MetricPoint> {
        let now = Utc::now();
        (0..n)
            .map(|i| MetricPoint::new(format!("M{i}"), now, i as u64, StandardUnit::Count, vec![]))
            .collect()
    }

    #[test]
    fn partition_keeps_order_and_caps_size() {
        let batches = MetricBatch::partition(points(45), 20);
        let sizes: Vec<usize> = batches.iter().map(MetricBatch::len).collect();
        assert_eq!(sizes, vec![20, 20, 5]);

        let names: Vec<String> = batches
            .into_iter()
            .flat_map(MetricBatch::into_points)
            .map(|p| p.name)
            .collect();
        let expected: Vec<String> = (0..45).map(|i| format!("M{i}")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn partition_exact_multiple_has_no_empty_tail() {
        let batches = MetricBatch::partition(points(40), 20);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 20));
    }

    #[test]
    fn partition_of_nothing_is_empty() {
        assert!(MetricBatch::partition(Vec::new(), 20).is_empty());
    }

    #[test]
    fn point_serializes_in_wire_shape() {
        let timestamp = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let point = MetricPoint::new(
            "QueueLatency",
            timestamp,
            1.5,
            StandardUnit::Seconds,
            vec![Dimension::new("QueueName", "default")],
        );

        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["MetricName"], "QueueLatency");
        assert_eq!(json["Unit"], "Seconds");
        assert_eq!(json["Value"], 1.5);
        assert_eq!(json["Dimensions"][0]["Name"], "QueueName");
        assert_eq!(point.dimension("QueueName"), Some("default"));
    }
}
