use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::AppConfig, ConfigError};

/// Environment prefix for overrides, e.g. `PLAYDV_QBITTORRENT__PASSWORD`.
const ENV_PREFIX: &str = "PLAYDV_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    load_config_with_prefix(path, ENV_PREFIX)
}

fn load_config_with_prefix(path: &Path, prefix: &str) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    // Keys contain underscores, so nesting uses a double underscore.
    let config: AppConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(prefix).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
