//! Configuration Loader
//!
//! Layers an optional configuration file under `SIDEKIQ_METRICS__*`
//! environment variables and validates the result.

use super::error::{ConfigResult, ConfigurationError};
use super::MetricsConfig;
use config::{Config, Environment, File};
use std::path::Path;
use tracing::debug;

/// Prefix of environment variables that override file values
pub const ENV_PREFIX: &str = "SIDEKIQ_METRICS";

/// Loads [`MetricsConfig`] from files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from environment variables only, on top of defaults
    pub fn load() -> ConfigResult<MetricsConfig> {
        Self::build(Config::builder().add_source(Self::environment()))
    }

    /// Load from `path` (format picked by extension), then environment overrides
    ///
    /// A missing file is an error; use [`ConfigLoader::load`] when no file exists.
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<MetricsConfig> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigurationError::LoadError {
                error: format!("configuration file not found: {}", path.display()),
            });
        }

        debug!(path = %path.display(), "Loading metrics configuration file");

        Self::build(
            Config::builder()
                .add_source(File::from(path))
                .add_source(Self::environment()),
        )
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ConfigResult<MetricsConfig> {
        let config: MetricsConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            config = %Self::sanitized(&config),
            "Metrics configuration loaded successfully"
        );

        Ok(config)
    }

    /// JSON view of `config` safe for logs; dimension values are masked
    pub fn sanitized(config: &MetricsConfig) -> serde_json::Value {
        let mut json = serde_json::json!(config);
        if let Some(dimensions) = json
            .get_mut("dimensions")
            .and_then(serde_json::Value::as_array_mut)
        {
            for dimension in dimensions {
                if let Some(value) = dimension.get_mut("Value") {
                    *value = serde_json::Value::String("[MASKED]".to_string());
                }
            }
        }
        json
    }
}
