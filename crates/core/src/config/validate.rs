use regex_lite::Regex;

use super::{types::AppConfig, ConfigError};

const MAX_PARALLEL_EPISODES: usize = 16;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate configuration
///
/// Rejects missing qBittorrent connection fields and out-of-range numeric
/// values. Runs before any processing starts.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let qb = &config.qbittorrent;
    if qb.host.trim().is_empty() {
        return Err(invalid("qbittorrent.host is required"));
    }
    if qb.port == 0 {
        return Err(invalid("qbittorrent.port is required and cannot be 0"));
    }
    if qb.username.trim().is_empty() {
        return Err(invalid("qbittorrent.username is required"));
    }
    if qb.password.is_empty() {
        return Err(invalid("qbittorrent.password is required"));
    }
    if qb.timeout_secs == 0 {
        return Err(invalid("qbittorrent.timeout_secs must be greater than 0"));
    }

    let processing = &config.processing;
    if processing.parallel_episodes == 0 || processing.parallel_episodes > MAX_PARALLEL_EPISODES {
        return Err(invalid(format!(
            "processing.parallel_episodes must be between 1 and {}, got {}",
            MAX_PARALLEL_EPISODES, processing.parallel_episodes
        )));
    }
    if !processing.min_file_size_gb.is_finite() || processing.min_file_size_gb < 0.0 {
        return Err(invalid(format!(
            "processing.min_file_size_gb must be a non-negative number, got {}",
            processing.min_file_size_gb
        )));
    }
    if processing.file_timeout_secs == 0 {
        return Err(invalid("processing.file_timeout_secs must be greater than 0"));
    }
    if processing.probe_timeout_secs == 0 {
        return Err(invalid("processing.probe_timeout_secs must be greater than 0"));
    }
    if processing.use_temp_dir && processing.temp_dir.as_os_str().is_empty() {
        return Err(invalid(
            "processing.temp_dir is required when processing.use_temp_dir is set",
        ));
    }

    let filters = &config.filters;
    if filters.max_seasons_per_torrent == 0 {
        return Err(invalid("filters.max_seasons_per_torrent must be at least 1"));
    }
    if filters.allowed_extensions.is_empty() {
        return Err(invalid("filters.allowed_extensions cannot be empty"));
    }
    for pattern in &filters.season_patterns {
        let regex = Regex::new(pattern).map_err(|e| {
            invalid(format!("filters.season_patterns: invalid regex {:?}: {}", pattern, e))
        })?;
        if regex.captures_len() < 2 {
            return Err(invalid(format!(
                "filters.season_patterns: {:?} needs a capture group for the season number",
                pattern
            )));
        }
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(format!(
            "logging.level must be one of {:?}, got {:?}",
            LOG_LEVELS, config.logging.level
        )));
    }
    if config.logging.keep_days == 0 {
        return Err(invalid("logging.keep_days must be at least 1"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
