//! FFprobe-based stream probe.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::config::ProcessingConfig;

use super::error::ProbeError;
use super::traits::StreamProbe;
use super::types::{MediaStreamRecord, SideData, StreamKind};

/// Probe implementation that shells out to ffprobe.
pub struct FfprobeProbe {
    ffprobe_path: PathBuf,
    timeout_secs: u64,
}

impl FfprobeProbe {
    /// Creates a probe using the given ffprobe binary and timeout.
    pub fn new(ffprobe_path: PathBuf, timeout_secs: u64) -> Self {
        Self {
            ffprobe_path,
            timeout_secs,
        }
    }

    /// Creates a probe from the processing configuration.
    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(config.ffprobe_path.clone(), config.probe_timeout_secs)
    }
}

#[async_trait]
impl StreamProbe for FfprobeProbe {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<Vec<MediaStreamRecord>, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let child = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ProbeError::Timeout {
            timeout_secs: self.timeout_secs,
        })??;

        if !output.status.success() {
            return Err(ProbeError::failed(format!(
                "ffprobe exited with code {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&stdout)
    }
}

#[derive(Deserialize)]
struct RawProbe {
    streams: Option<Vec<RawStream>>,
}

#[derive(Deserialize)]
struct RawStream {
    index: Option<u32>,
    codec_type: Option<String>,
    codec_name: Option<String>,
    color_transfer: Option<String>,
    #[serde(default)]
    side_data_list: Vec<RawSideData>,
    #[serde(default)]
    tags: HashMap<String, String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    disposition: RawDisposition,
}

#[derive(Deserialize)]
struct RawSideData {
    side_data_type: Option<String>,
    dv_profile: Option<u8>,
}

#[derive(Deserialize, Default)]
struct RawDisposition {
    #[serde(default)]
    forced: u8,
    #[serde(default)]
    hearing_impaired: u8,
    #[serde(default)]
    attached_pic: u8,
}

impl RawStream {
    fn tag(&self, key: &str) -> Option<String> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Parses ffprobe `-show_streams` JSON into typed records ordered by index.
///
/// A missing `streams` key, an entry without `index`/`codec_type`, or a
/// duplicated index is a [`ProbeError::Malformed`]. Data and attachment
/// streams, and cover art carried as a video stream, are quarantined.
pub fn parse_probe_output(output: &str) -> Result<Vec<MediaStreamRecord>, ProbeError> {
    let probe: RawProbe = serde_json::from_str(output)
        .map_err(|e| ProbeError::malformed(format!("Failed to parse ffprobe output: {}", e)))?;

    let raw_streams = probe
        .streams
        .ok_or_else(|| ProbeError::malformed("ffprobe output has no `streams` array"))?;

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(raw_streams.len());

    for (position, raw) in raw_streams.into_iter().enumerate() {
        let index = raw.index.ok_or_else(|| {
            ProbeError::malformed(format!("stream entry {} has no index", position))
        })?;
        if !seen.insert(index) {
            return Err(ProbeError::malformed(format!(
                "stream index {} appears more than once",
                index
            )));
        }

        let codec_type = raw.codec_type.as_deref().ok_or_else(|| {
            ProbeError::malformed(format!("stream {} has no codec_type", index))
        })?;

        let Some(kind) = StreamKind::from_codec_type(codec_type) else {
            debug!(index, codec_type, "Quarantined unsupported stream kind");
            continue;
        };

        if kind == StreamKind::Video && raw.disposition.attached_pic != 0 {
            debug!(index, "Quarantined attached picture");
            continue;
        }

        let side_data = raw
            .side_data_list
            .iter()
            .filter_map(|sd| {
                sd.side_data_type.as_ref().map(|t| SideData {
                    side_data_type: t.clone(),
                    dv_profile: sd.dv_profile,
                })
            })
            .collect();

        records.push(MediaStreamRecord {
            index,
            kind,
            codec: raw
                .codec_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string())
                .to_lowercase(),
            color_transfer: raw.color_transfer.clone(),
            side_data,
            language: raw.tag("language"),
            title: raw.tag("title"),
            width: raw.width,
            height: raw.height,
            forced: raw.disposition.forced != 0,
            hearing_impaired: raw.disposition.hearing_impaired != 0,
        });
    }

    records.sort_by_key(|r| r.index);
    Ok(records)
}
