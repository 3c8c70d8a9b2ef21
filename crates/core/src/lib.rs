pub mod classifier;
pub mod config;
pub mod events;
pub mod executor;
pub mod filter;
pub mod orchestrator;
pub mod placer;
pub mod planner;
pub mod probe;
pub mod testing;
pub mod torrent_client;

pub use classifier::{classify, select_audio, select_subtitles, TrackSelection, VideoClassification};
pub use config::{
    load_config, load_config_from_str, validate_config, AppConfig, ConfigError, SanitizedConfig,
};
pub use events::{create_event_system, EventHandle, PipelineEvent};
pub use executor::{CancelHandle, ConversionExecutor, ConversionResult, FfmpegExecutor};
pub use filter::{evaluate, is_eligible, FilterVerdict, RejectionReason, TorrentJob};
pub use orchestrator::{BatchOrchestrator, BatchReport, JobStatus};
pub use planner::{job_key, plan, ConversionPlan};
pub use probe::{FfprobeProbe, MediaStreamRecord, StreamProbe};
pub use torrent_client::{QBittorrentClient, TorrentClient};
