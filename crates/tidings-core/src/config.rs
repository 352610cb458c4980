//! Loading `tidings.toml`.

use std::path::Path;

use tidings_types::{ConfigError, TidingsConfig};
use tracing::debug;

/// Parse and validate a TOML document.
pub fn parse_config(source: &str) -> Result<TidingsConfig, ConfigError> {
    let config: TidingsConfig =
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate the config file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<TidingsConfig, ConfigError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&source)?;
    debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}
