//! # Publisher Configuration
//!
//! Immutable settings for the metrics publisher and its reporting loop. A
//! configuration is validated once, when the lifecycle controller is enabled
//! or a [`Publisher`](crate::publisher::Publisher) is built, so a bad value
//! never reaches the scheduling loop.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sidekiq_cloudwatch_metrics::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // File values layered under SIDEKIQ_METRICS__* environment variables
//! let config = ConfigLoader::load_from_file("config/metrics.toml")?;
//! println!("publishing to {} every {}s", config.namespace, config.interval_seconds);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::constants::{dimensions, limits, DEFAULT_NAMESPACE};
use crate::models::Dimension;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration for the metrics publisher
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Namespace every batch is tagged with
    pub namespace: String,

    /// Dimensions appended to every metric point, in order
    pub dimensions: Vec<Dimension>,

    /// Seconds between publish cycles
    pub interval_seconds: u64,

    /// Maximum number of points per sink call
    pub max_batch_size: usize,

    /// How long a stop waits for an in-flight cycle before aborting it
    pub shutdown_timeout_ms: u64,

    /// Emit a per-process `Utilization` point dimensioned by hostname
    pub process_metrics: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            dimensions: Vec::new(),
            interval_seconds: 60,
            max_batch_size: 20,
            shutdown_timeout_ms: 5000,
            process_metrics: false,
        }
    }
}

impl MetricsConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::new(name, value));
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_seconds = interval.as_secs();
        self
    }

    pub fn with_process_metrics(mut self, enabled: bool) -> Self {
        self.process_metrics = enabled;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Validate the configuration against backend limits
    pub fn validate(&self) -> ConfigResult<()> {
        if self.namespace.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "namespace",
                "metrics configuration",
            ));
        }
        if self.namespace.len() > limits::MAX_NAME_LENGTH {
            return Err(ConfigurationError::invalid_value(
                "namespace",
                &self.namespace,
                format!("must be at most {} characters", limits::MAX_NAME_LENGTH),
            ));
        }
        if self.namespace.starts_with(limits::RESERVED_NAMESPACE_PREFIX) {
            return Err(ConfigurationError::invalid_value(
                "namespace",
                &self.namespace,
                format!(
                    "namespaces starting with '{}' are reserved",
                    limits::RESERVED_NAMESPACE_PREFIX
                ),
            ));
        }

        if self.max_batch_size == 0 || self.max_batch_size > limits::MAX_BATCH_SIZE {
            return Err(ConfigurationError::invalid_value(
                "max_batch_size",
                self.max_batch_size.to_string(),
                format!("must be between 1 and {}", limits::MAX_BATCH_SIZE),
            ));
        }

        if self.interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "interval_seconds",
                "0",
                "must be greater than 0",
            ));
        }

        self.validate_dimensions()
    }

    fn validate_dimensions(&self) -> ConfigResult<()> {
        // One slot stays free for the per-point QueueName/Hostname dimension
        let max_global = limits::MAX_DIMENSIONS - 1;
        if self.dimensions.len() > max_global {
            return Err(ConfigurationError::invalid_value(
                "dimensions",
                self.dimensions.len().to_string(),
                format!("at most {max_global} global dimensions are allowed"),
            ));
        }

        let mut seen = HashSet::new();
        for dimension in &self.dimensions {
            if dimension.name.is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    "dimensions[].name",
                    "global dimension",
                ));
            }
            if dimension.value.is_empty() {
                return Err(ConfigurationError::invalid_value(
                    format!("dimensions.{}", dimension.name),
                    "",
                    "dimension values must not be empty",
                ));
            }
            if dimension.name.len() > limits::MAX_NAME_LENGTH {
                return Err(ConfigurationError::invalid_value(
                    "dimensions[].name",
                    &dimension.name,
                    format!("must be at most {} characters", limits::MAX_NAME_LENGTH),
                ));
            }
            if dimension.value.len() > limits::MAX_DIMENSION_VALUE_LENGTH {
                return Err(ConfigurationError::invalid_value(
                    format!("dimensions.{}", dimension.name),
                    &dimension.value,
                    format!(
                        "must be at most {} characters",
                        limits::MAX_DIMENSION_VALUE_LENGTH
                    ),
                ));
            }
            if dimensions::RESERVED.contains(&dimension.name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "dimensions[].name",
                    &dimension.name,
                    "name is reserved for per-point dimensions",
                ));
            }
            if !seen.insert(dimension.name.as_str()) {
                return Err(ConfigurationError::DuplicateDimension {
                    name: dimension.name.clone(),
                });
            }
        }

        Ok(())
    }
}
