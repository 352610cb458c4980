//! Configuration types.
//!
//! `TidingsConfig` mirrors a `tidings.toml` file with a `[bus]` and a
//! `[logging]` table. Every field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TidingsConfig {
    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TidingsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bus.validate()
    }
}

/// Event bus settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Queue capacity used by `subscribe_default`.
    #[serde(default = "default_capacity")]
    pub default_capacity: usize,

    /// Upper bound for any requested capacity. Larger requests are clamped.
    #[serde(default)]
    pub max_capacity: Option<usize>,
}

fn default_capacity() -> usize {
    64
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_capacity: default_capacity(),
            max_capacity: None,
        }
    }
}

impl BusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.max_capacity {
            Some(max) if max < self.default_capacity => Err(ConfigError::Invalid(format!(
                "max_capacity ({max}) is below default_capacity ({})",
                self.default_capacity
            ))),
            _ => Ok(()),
        }
    }

    /// Apply `max_capacity` to a requested capacity.
    pub fn clamp_capacity(&self, requested: usize) -> usize {
        match self.max_capacity {
            Some(max) => requested.min(max),
            None => requested,
        }
    }
}

/// Process-level logging settings, consumed by `tidings-observe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Bridge spans to OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
            otel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = TidingsConfig::default();
        assert_eq!(config.bus.default_capacity, 64);
        assert_eq!(config.bus.max_capacity, None);
        assert_eq!(config.logging.filter, "info");
        assert!(!config.logging.json);
        assert!(!config.logging.otel);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: TidingsConfig = toml::from_str("").unwrap();
        assert_eq!(config, TidingsConfig::default());
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
[bus]
default_capacity = 16
max_capacity = 1024

[logging]
filter = "tidings_core=debug"
json = true
"#;
        let config: TidingsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bus.default_capacity, 16);
        assert_eq!(config.bus.max_capacity, Some(1024));
        assert_eq!(config.logging.filter, "tidings_core=debug");
        assert!(config.logging.json);
        assert!(!config.logging.otel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_below_default_is_invalid() {
        let bus = BusConfig {
            default_capacity: 32,
            max_capacity: Some(8),
        };
        assert!(matches!(bus.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_clamp_capacity() {
        let unbounded = BusConfig::default();
        assert_eq!(unbounded.clamp_capacity(1_000_000), 1_000_000);

        let bounded = BusConfig {
            default_capacity: 4,
            max_capacity: Some(10),
        };
        assert_eq!(bounded.clamp_capacity(3), 3);
        assert_eq!(bounded.clamp_capacity(50), 10);
        assert_eq!(bounded.clamp_capacity(0), 0);
    }
}
