//! Plan construction.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::classifier::{TrackRole, TrackSelection, VideoClassification};
use crate::config::AppConfig;

use super::error::PlanningError;
use super::types::{ConversionPlan, PlannedStream, StreamAction, VideoAction};

/// Audio codecs the MP4 muxer accepts as-is.
const MP4_AUDIO_CODECS: [&str; 7] = ["aac", "ac3", "eac3", "mp3", "alac", "opus", "flac"];
/// Text subtitle codecs that convert to `mov_text`.
const TEXT_SUBTITLE_CODECS: [&str; 5] = ["subrip", "ass", "ssa", "webvtt", "text"];
const MP4_SUBTITLE_CODEC: &str = "mov_text";

const FALLBACK_AUDIO_CODEC: &str = "eac3";
const FALLBACK_AUDIO_BITRATE_KBPS: u32 = 640;

const UHD_WIDTH: u32 = 3840;
const DUAL_LAYER_DV_PROFILE: u8 = 7;

const JOB_KEY_NAME_LEN: usize = 48;
const JOB_KEY_HASH_LEN: usize = 12;

/// Build the conversion plan for one file.
///
/// Video is always stream-copied. Audio MP4 cannot carry is transcoded to
/// E-AC-3, text subtitles become `mov_text` and image subtitles are dropped.
pub fn plan(
    input: &Path,
    classification: &VideoClassification,
    audio: &[TrackSelection],
    subtitles: &[TrackSelection],
    config: &AppConfig,
    job_key: &str,
) -> Result<ConversionPlan, PlanningError> {
    let filters = &config.filters;

    if filters.require_dv && !classification.is_dolby_vision {
        return Err(PlanningError::rejected(format!(
            "{} is not Dolby Vision",
            input.display()
        )));
    }
    if filters.require_4k {
        if let Some(width) = classification.width.filter(|w| *w < UHD_WIDTH) {
            return Err(PlanningError::rejected(format!(
                "{} is {} pixels wide, 4K required",
                input.display(),
                width
            )));
        }
    }
    if classification.dv_profile == Some(DUAL_LAYER_DV_PROFILE) {
        warn!(
            input = %input.display(),
            "Dual-layer Dolby Vision profile 7, only the base layer and RPU are kept"
        );
    }

    let (output_path, staging_path) = output_targets(input, config, job_key)?;
    let container = config.processing.container;

    let selected_audio = audio
        .iter()
        .map(|selection| PlannedStream {
            selection: selection.clone(),
            action: audio_action(&selection.codec),
        })
        .collect();

    let mut selected_subtitles: Vec<PlannedStream> = subtitles
        .iter()
        .filter_map(|selection| match subtitle_action(&selection.codec) {
            Some(action) => Some(PlannedStream {
                selection: selection.clone(),
                action,
            }),
            None => {
                warn!(
                    input = %input.display(),
                    stream = selection.stream_index,
                    codec = %selection.codec,
                    "Dropping image subtitle, MP4 cannot carry it"
                );
                None
            }
        })
        .collect();
    if subtitles.iter().any(|s| s.role == TrackRole::Primary) {
        promote_default_subtitle(&mut selected_subtitles);
    }

    let plan = ConversionPlan {
        input_path: input.to_path_buf(),
        output_path,
        staging_path,
        video_stream_index: classification.source_stream_index,
        video_codec: classification.codec.clone(),
        video_action: VideoAction::Copy,
        selected_audio,
        selected_subtitles,
        container,
        dolby_vision: classification.is_dolby_vision,
    };

    debug!(
        input = %plan.input_path.display(),
        output = %plan.output_path.display(),
        audio = plan.selected_audio.len(),
        subtitles = plan.selected_subtitles.len(),
        "Built conversion plan"
    );

    Ok(plan)
}

/// Final path and optional staging path a plan for `input` writes to.
///
/// Depends only on the input path and configuration, so the orchestrator
/// can detect colliding outputs before any file is probed.
pub fn output_targets(
    input: &Path,
    config: &AppConfig,
    job_key: &str,
) -> Result<(PathBuf, Option<PathBuf>), PlanningError> {
    let stem = input
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PlanningError::rejected(format!("{} has no file name", input.display())))?;
    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(config.processing.container.extension());
    let file_name = PathBuf::from(file_name);

    let output_dir = match &config.paths.output_dir {
        Some(dir) => dir.clone(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let output_path = output_dir.join(&file_name);
    if output_path == input {
        return Err(PlanningError::rejected(format!(
            "output would overwrite the input {}",
            input.display()
        )));
    }

    let staging_path = config
        .processing
        .use_temp_dir
        .then(|| config.processing.temp_dir.join(job_key).join(&file_name));

    Ok((output_path, staging_path))
}

/// Give the default role to the first surviving non-forced subtitle when the
/// selected primary was an image subtitle and got dropped.
fn promote_default_subtitle(subtitles: &mut Vec<PlannedStream>) {
    if subtitles.iter().any(PlannedStream::is_default) {
        return;
    }
    if let Some(position) = subtitles.iter().position(|s| !s.is_forced()) {
        let mut promoted = subtitles.remove(position);
        debug!(
            stream = promoted.selection.stream_index,
            language = %promoted.selection.language,
            "Promoting subtitle to default"
        );
        promoted.selection.role = TrackRole::Primary;
        subtitles.insert(0, promoted);
    }
}

fn audio_action(codec: &str) -> StreamAction {
    if MP4_AUDIO_CODECS.contains(&codec) {
        StreamAction::Copy
    } else {
        StreamAction::Transcode {
            codec: FALLBACK_AUDIO_CODEC.to_string(),
            bitrate_kbps: Some(FALLBACK_AUDIO_BITRATE_KBPS),
        }
    }
}

fn subtitle_action(codec: &str) -> Option<StreamAction> {
    if codec == MP4_SUBTITLE_CODEC {
        Some(StreamAction::Copy)
    } else if TEXT_SUBTITLE_CODECS.contains(&codec) {
        Some(StreamAction::Transcode {
            codec: MP4_SUBTITLE_CODEC.to_string(),
            bitrate_kbps: None,
        })
    } else {
        None
    }
}

/// Stable staging directory name for a job: the sanitized job name plus a
/// short hash of its content path.
pub fn job_key(name: &str, content_path: &Path) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .take(JOB_KEY_NAME_LEN)
        .collect();
    if sanitized.trim_matches(['_', '.']).is_empty() {
        sanitized = "job".to_string();
    }

    let digest = format!(
        "{:x}",
        Sha256::digest(content_path.to_string_lossy().as_bytes())
    );
    format!("{}-{}", sanitized, &digest[..JOB_KEY_HASH_LEN])
}
