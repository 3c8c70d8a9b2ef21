//! Testing utilities and mock implementations.
//!
//! Mocks for every external seam of the pipeline, so a full batch can run
//! without ffprobe, ffmpeg or a qBittorrent instance.
//!
//! # Example
//!
//! ```rust,ignore
//! use playdv_core::testing::{MockExecutor, MockProbe};
//!
//! let probe = Arc::new(MockProbe::new());
//! let executor = Arc::new(MockExecutor::new());
//!
//! probe.fail_for("/downloads/Show.S01E02.mkv", "Malformed probe output").await;
//! let orchestrator = BatchOrchestrator::new(probe, executor.clone(), config);
//! ```

mod mock_executor;
mod mock_probe;
mod mock_torrent_client;

pub use mock_executor::MockExecutor;
pub use mock_probe::MockProbe;
pub use mock_torrent_client::MockTorrentClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::classifier::{classify, select_audio, select_subtitles};
    use crate::config::{
        AppConfig, FilterConfig, LoggingConfig, PathsConfig, ProcessingConfig, QBittorrentConfig,
    };
    use crate::planner::{job_key, plan, ConversionPlan};
    use crate::probe::{MediaStreamRecord, SideData, StreamKind};

    /// A typical DV web release: HEVC video with DOVI profile 8, English and
    /// Spanish audio, an English SDH and a Spanish subtitle.
    pub fn sample_streams() -> Vec<MediaStreamRecord> {
        let mut dovi = SideData::new("DOVI configuration record");
        dovi.dv_profile = Some(8);

        let mut sdh = MediaStreamRecord::new(3, StreamKind::Subtitle, "subrip")
            .with_language("eng")
            .with_title("English SDH");
        sdh.hearing_impaired = true;

        vec![
            MediaStreamRecord::new(0, StreamKind::Video, "hevc")
                .with_color_transfer("smpte2084")
                .with_side_data(dovi)
                .with_dimensions(3840, 2160),
            MediaStreamRecord::new(1, StreamKind::Audio, "eac3")
                .with_language("eng")
                .with_title("English"),
            MediaStreamRecord::new(2, StreamKind::Audio, "ac3")
                .with_language("spa")
                .with_title("Spanish"),
            sdh,
            MediaStreamRecord::new(4, StreamKind::Subtitle, "subrip")
                .with_language("spa")
                .with_title("Spanish"),
        ]
    }

    /// A valid configuration writing into `/test/plex`.
    pub fn test_config() -> AppConfig {
        AppConfig {
            qbittorrent: QBittorrentConfig {
                host: "localhost".to_string(),
                port: 8080,
                username: "admin".to_string(),
                password: "test".to_string(),
                timeout_secs: 30,
            },
            paths: PathsConfig {
                output_dir: Some(PathBuf::from("/test/plex")),
                ..PathsConfig::default()
            },
            processing: ProcessingConfig::default(),
            filters: FilterConfig {
                require_4k: true,
                require_dv: true,
                excluded_categories: vec!["music".to_string(), "software".to_string()],
                ..FilterConfig::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Plan for [`sample_streams`] keeping English and Spanish tracks, with
    /// the output written under `output_dir`.
    pub fn sample_plan(input: &Path, output_dir: &Path) -> ConversionPlan {
        let mut config = test_config();
        config.paths.output_dir = Some(output_dir.to_path_buf());

        let streams = sample_streams();
        let priority = vec!["eng".to_string(), "spa".to_string()];
        let classification = classify(&streams).expect("sample streams have one video");
        let audio = select_audio(&streams, &priority);
        let subtitles = select_subtitles(&streams, &priority, false);

        plan(
            input,
            &classification,
            &audio,
            &subtitles,
            &config,
            &job_key("sample", input),
        )
        .expect("sample plan is accepted")
    }
}
