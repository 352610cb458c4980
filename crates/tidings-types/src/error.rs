use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by bus operations.
///
/// Drops, publishing to an empty topic, and redundant detaches are not
/// errors; only operations the bus can no longer perform are.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("event bus is closed")]
    Closed,
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_error_display() {
        assert_eq!(BusError::Closed.to_string(), "event bus is closed");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("max_capacity below default_capacity".to_string());
        assert_eq!(
            err.to_string(),
            "invalid config: max_capacity below default_capacity"
        );

        let err = ConfigError::Io {
            path: PathBuf::from("/nope/tidings.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nope/tidings.toml"));
    }
}
