use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub qbittorrent: QBittorrentConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// qBittorrent WebUI connection settings.
///
/// Every field defaults to empty so that a missing value surfaces as a
/// validation error naming the key instead of a generic parse failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Host name or address, optionally with an `http(s)://` scheme.
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_qbittorrent_timeout")]
    pub timeout_secs: u32,
}

impl QBittorrentConfig {
    /// Base URL of the WebUI, without trailing slash.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }
}

fn default_qbittorrent_timeout() -> u32 {
    30
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Where finished MP4 files land. Falls back to the source file's
    /// directory when unset.
    #[serde(default, alias = "plex_dir")]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Output container. Only MP4 is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFormat {
    #[default]
    Mp4,
}

impl ContainerFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
        }
    }

    /// Muxer name passed to ffmpeg's `-f`.
    pub fn ffmpeg_format(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
        }
    }
}

/// Processing knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    /// Number of files converted in parallel.
    #[serde(default = "default_parallel_episodes")]
    pub parallel_episodes: usize,

    /// Delete source files whose conversion succeeded.
    #[serde(default)]
    pub delete_after_success: bool,

    /// Write outputs into `temp_dir` first and move them into place on success.
    #[serde(default)]
    pub use_temp_dir: bool,

    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Minimum torrent size in GiB (1 GB = 1024^3 bytes).
    #[serde(default = "default_min_file_size_gb")]
    pub min_file_size_gb: f64,

    /// Timeout for a single conversion in seconds.
    #[serde(default = "default_file_timeout")]
    pub file_timeout_secs: u64,

    /// Timeout for a single ffprobe call in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Audio languages to keep, in priority order (ISO 639-2 codes).
    #[serde(default = "default_languages")]
    pub audio_languages: Vec<String>,

    /// Subtitle languages to keep, in priority order.
    #[serde(default = "default_languages")]
    pub subtitle_languages: Vec<String>,

    /// Let an SDH subtitle take the primary slot over a regular one.
    #[serde(default)]
    pub prefer_sdh_subtitles: bool,

    /// Also keep tracks whose language is not in the priority lists.
    #[serde(default)]
    pub keep_unmatched_tracks: bool,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    #[serde(default)]
    pub container: ContainerFormat,
}

fn default_parallel_episodes() -> usize {
    2
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("playdv")
}

fn default_min_file_size_gb() -> f64 {
    1.0
}

fn default_file_timeout() -> u64 {
    14_400 // 4 hours
}

fn default_probe_timeout() -> u64 {
    60
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_episodes: default_parallel_episodes(),
            delete_after_success: false,
            use_temp_dir: false,
            temp_dir: default_temp_dir(),
            min_file_size_gb: default_min_file_size_gb(),
            file_timeout_secs: default_file_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            audio_languages: default_languages(),
            subtitle_languages: default_languages(),
            prefer_sdh_subtitles: false,
            keep_unmatched_tracks: false,
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            container: ContainerFormat::default(),
        }
    }
}

/// Torrent eligibility filters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub require_4k: bool,

    #[serde(default = "default_true")]
    pub require_dv: bool,

    #[serde(default)]
    pub excluded_categories: Vec<String>,

    #[serde(default = "default_max_seasons")]
    pub max_seasons_per_torrent: u32,

    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Regexes used to infer season numbers from file names. The first
    /// capture group must hold the season number.
    #[serde(default = "default_season_patterns")]
    pub season_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_seasons() -> u32 {
    1
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".mkv".to_string()]
}

/// Season patterns used when the config does not override them.
pub fn default_season_patterns() -> Vec<String> {
    vec![
        r"(?i)\bS(\d{1,2})[ ._-]?E\d{1,3}".to_string(),
        r"(?i)\bseason[ ._-]?(\d{1,2})\b".to_string(),
        r"(?i)\b(\d{1,2})x\d{2,3}\b".to_string(),
        r"(?i)\bS(\d{1,2})\b".to_string(),
    ]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            require_4k: true,
            require_dv: true,
            excluded_categories: Vec::new(),
            max_seasons_per_torrent: default_max_seasons(),
            allowed_extensions: default_allowed_extensions(),
            season_patterns: default_season_patterns(),
        }
    }
}

impl FilterConfig {
    /// Whether `path` has one of the allowed extensions (case-insensitive,
    /// leading dot optional in the config).
    pub fn allows_extension(&self, path: &std::path::Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Days to keep event log files.
    #[serde(default = "default_keep_days")]
    pub keep_days: u32,
    /// Emit console logs as JSON.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_keep_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            keep_days: default_keep_days(),
            json: false,
        }
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub qbittorrent: SanitizedQBittorrentConfig,
    pub paths: PathsConfig,
    pub processing: ProcessingConfig,
    pub filters: FilterConfig,
    pub logging: LoggingConfig,
}

/// qBittorrent block with the password hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

impl From<&AppConfig> for SanitizedConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            qbittorrent: SanitizedQBittorrentConfig {
                host: config.qbittorrent.host.clone(),
                port: config.qbittorrent.port,
                username: config.qbittorrent.username.clone(),
                password_configured: !config.qbittorrent.password.is_empty(),
                timeout_secs: config.qbittorrent.timeout_secs,
            },
            paths: config.paths.clone(),
            processing: config.processing.clone(),
            filters: config.filters.clone(),
            logging: config.logging.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const SAMPLE: &str = r#"
[qbittorrent]
host = "localhost"
port = 8080
username = "admin"
password = "test"

[paths]
plex_dir = "/test/plex"
log_dir = "/test/logs"

[processing]
parallel_episodes = 2
delete_after_success = false
use_temp_dir = false
temp_dir = "/tmp"
min_file_size_gb = 1

[filters]
require_4k = true
require_dv = true
excluded_categories = ["music", "software"]
max_seasons_per_torrent = 1
allowed_extensions = [".mkv"]

[logging]
level = "INFO"
keep_days = 30
"#;

    #[test]
    fn test_deserialize_sample_config() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.qbittorrent.host, "localhost");
        assert_eq!(config.qbittorrent.port, 8080);
        assert_eq!(config.paths.output_dir, Some(PathBuf::from("/test/plex")));
        assert_eq!(config.processing.parallel_episodes, 2);
        assert_eq!(config.processing.min_file_size_gb, 1.0);
        assert_eq!(
            config.filters.excluded_categories,
            vec!["music".to_string(), "software".to_string()]
        );
        assert_eq!(config.logging.keep_days, 30);
    }

    #[test]
    fn test_deserialize_defaults() {
        let toml = r#"
[qbittorrent]
host = "localhost"
port = 8080
username = "admin"
password = "secret"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.processing.parallel_episodes, 2);
        assert!(!config.processing.delete_after_success);
        assert_eq!(config.processing.audio_languages, vec!["eng".to_string()]);
        assert_eq!(config.processing.container, ContainerFormat::Mp4);
        assert!(config.filters.require_dv);
        assert_eq!(config.filters.max_seasons_per_torrent, 1);
        assert_eq!(config.filters.season_patterns, default_season_patterns());
        assert_eq!(config.logging.level, "info");
        assert!(config.paths.output_dir.is_none());
    }

    #[test]
    fn test_base_url() {
        let mut qb = QBittorrentConfig {
            host: "localhost".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(qb.base_url(), "http://localhost:8080");

        qb.host = "https://seedbox.example/".to_string();
        qb.port = 443;
        assert_eq!(qb.base_url(), "https://seedbox.example:443");
    }

    #[test]
    fn test_allows_extension() {
        let filters = FilterConfig {
            allowed_extensions: vec![".mkv".to_string(), "m2ts".to_string()],
            ..Default::default()
        };
        assert!(filters.allows_extension(Path::new("/a/Show.S01E01.mkv")));
        assert!(filters.allows_extension(Path::new("/a/MOVIE.MKV")));
        assert!(filters.allows_extension(Path::new("/a/disc.m2ts")));
        assert!(!filters.allows_extension(Path::new("/a/readme.nfo")));
        assert!(!filters.allows_extension(Path::new("/a/noext")));
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.qbittorrent.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("\"test\""));
        assert!(json.contains("password_configured"));
    }
}
