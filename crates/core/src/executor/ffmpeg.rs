//! FFmpeg-based executor.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use crate::classifier::is_hevc;
use crate::config::ProcessingConfig;
use crate::planner::{ConversionPlan, PlannedStream, StreamAction};

use super::cancel::CancelSignal;
use super::traits::ConversionExecutor;
use super::types::{ConversionResult, CANCELLED_DETAIL};

/// Number of trailing stderr lines kept for diagnostics.
const STDERR_TAIL_LINES: usize = 20;
/// How long to wait for stderr to close after the process exits.
const STDERR_DRAIN: Duration = Duration::from_secs(2);

/// Executor that runs a local ffmpeg binary.
pub struct FfmpegExecutor {
    ffmpeg_path: PathBuf,
    timeout_secs: u64,
}

impl FfmpegExecutor {
    pub fn new(ffmpeg_path: PathBuf, timeout_secs: u64) -> Self {
        Self {
            ffmpeg_path,
            timeout_secs,
        }
    }

    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.file_timeout_secs)
    }

    async fn run(
        &self,
        plan: &ConversionPlan,
        cancel: &mut CancelSignal,
    ) -> Result<Option<i32>, Failure> {
        if cancel.is_cancelled() {
            return Err(Failure::new(None, CANCELLED_DETAIL));
        }

        let write_path = plan.write_path();
        if let Some(parent) = write_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Failure::new(
                    None,
                    format!("Failed to create {}: {}", parent.display(), e),
                )
            })?;
        }

        let args = build_args(plan);
        debug!(ffmpeg = %self.ffmpeg_path.display(), ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Failure::new(
                        None,
                        format!("FFmpeg not found at path: {}", self.ffmpeg_path.display()),
                    )
                } else {
                    Failure::new(None, format!("Failed to spawn ffmpeg: {}", e))
                }
            })?;

        let tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
        let reader = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(collect_tail(stderr, Arc::clone(&tail))));

        let outcome = tokio::select! {
            status = child.wait() => Outcome::Exited(status),
            _ = sleep(Duration::from_secs(self.timeout_secs)) => Outcome::TimedOut,
            _ = cancel.cancelled() => Outcome::Cancelled,
        };

        if !matches!(outcome, Outcome::Exited(_)) {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill ffmpeg");
            }
        }

        if let Some(reader) = reader {
            match outcome {
                Outcome::Exited(_) => {
                    if timeout(STDERR_DRAIN, reader).await.is_err() {
                        debug!("stderr still open after ffmpeg exited");
                    }
                }
                _ => reader.abort(),
            }
        }
        let tail = snapshot(&tail);

        match outcome {
            Outcome::Exited(Ok(status)) if status.success() => Ok(status.code()),
            Outcome::Exited(Ok(status)) => Err(Failure::new(
                status.code(),
                exit_detail(status, &tail),
            )),
            Outcome::Exited(Err(e)) => {
                Err(Failure::new(None, format!("Failed to wait for ffmpeg: {}", e)))
            }
            Outcome::TimedOut => Err(Failure::new(
                None,
                format!("timed out after {}s", self.timeout_secs),
            )),
            Outcome::Cancelled => Err(Failure::new(None, CANCELLED_DETAIL)),
        }
    }
}

#[async_trait]
impl ConversionExecutor for FfmpegExecutor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn execute(&self, plan: &ConversionPlan, mut cancel: CancelSignal) -> ConversionResult {
        let start = Instant::now();
        let outcome = self.run(plan, &mut cancel).await;
        let duration_secs = start.elapsed().as_secs_f64();

        match outcome {
            Ok(exit_code) => {
                info!(
                    input = %plan.input_path.display(),
                    output = %plan.write_path().display(),
                    duration_secs,
                    "Conversion finished"
                );
                ConversionResult::succeeded(plan, exit_code, duration_secs)
            }
            Err(failure) => {
                warn!(
                    input = %plan.input_path.display(),
                    exit_code = ?failure.exit_code,
                    detail = %failure.detail,
                    "Conversion failed"
                );
                remove_partial(plan.write_path()).await;
                ConversionResult::conversion_failed(
                    plan,
                    failure.exit_code,
                    duration_secs,
                    failure.detail,
                )
            }
        }
    }
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

struct Failure {
    exit_code: Option<i32>,
    detail: String,
}

impl Failure {
    fn new(exit_code: Option<i32>, detail: impl Into<String>) -> Self {
        Self {
            exit_code,
            detail: detail.into(),
        }
    }
}

async fn collect_tail(stderr: ChildStderr, tail: Arc<Mutex<VecDeque<String>>>) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Ok(mut tail) = tail.lock() {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }
}

fn snapshot(tail: &Mutex<VecDeque<String>>) -> Vec<String> {
    tail.lock()
        .map(|t| t.iter().cloned().collect())
        .unwrap_or_default()
}

fn exit_detail(status: ExitStatus, tail: &[String]) -> String {
    let code = status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    if tail.is_empty() {
        format!("ffmpeg exited with code {}", code)
    } else {
        format!("ffmpeg exited with code {}:\n{}", code, tail.join("\n"))
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn stream_args(args: &mut Vec<String>, spec: char, position: usize, stream: &PlannedStream) {
    match &stream.action {
        StreamAction::Copy => {
            args.push(format!("-c:{}:{}", spec, position));
            args.push("copy".to_string());
        }
        StreamAction::Transcode {
            codec,
            bitrate_kbps,
        } => {
            args.push(format!("-c:{}:{}", spec, position));
            args.push(codec.clone());
            if let Some(kbps) = bitrate_kbps {
                args.push(format!("-b:{}:{}", spec, position));
                args.push(format!("{}k", kbps));
            }
        }
    }

    args.push(format!("-metadata:s:{}:{}", spec, position));
    args.push(format!("language={}", stream.selection.language));
    if let Some(title) = &stream.selection.title {
        args.push(format!("-metadata:s:{}:{}", spec, position));
        args.push(format!("title={}", title));
    }

    let disposition = if stream.is_default() {
        "default"
    } else if stream.is_forced() {
        "forced"
    } else {
        "0"
    };
    args.push(format!("-disposition:{}:{}", spec, position));
    args.push(disposition.to_string());
}

/// Build the ffmpeg argument list for a plan.
pub fn build_args(plan: &ConversionPlan) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        path_arg(&plan.input_path),
        "-map".to_string(),
        format!("0:{}", plan.video_stream_index),
    ];

    for stream in plan.selected_audio.iter().chain(&plan.selected_subtitles) {
        args.push("-map".to_string());
        args.push(format!("0:{}", stream.selection.stream_index));
    }

    args.extend(["-c:v".to_string(), "copy".to_string()]);
    if plan.dolby_vision {
        args.extend([
            "-tag:v".to_string(),
            "dvh1".to_string(),
            "-strict".to_string(),
            "unofficial".to_string(),
        ]);
    } else if is_hevc(&plan.video_codec) {
        args.extend(["-tag:v".to_string(), "hvc1".to_string()]);
    }

    for (position, stream) in plan.selected_audio.iter().enumerate() {
        stream_args(&mut args, 'a', position, stream);
    }
    for (position, stream) in plan.selected_subtitles.iter().enumerate() {
        stream_args(&mut args, 's', position, stream);
    }

    args.extend([
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-f".to_string(),
        plan.container.ffmpeg_format().to_string(),
        path_arg(plan.write_path()),
    ]);

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CancelHandle;
    use crate::testing::fixtures::sample_plan;

    fn position_of(args: &[String], flag: &str) -> Option<usize> {
        args.iter().position(|a| a == flag)
    }

    fn value_after(args: &[String], flag: &str) -> Option<String> {
        position_of(args, flag).and_then(|i| args.get(i + 1).cloned())
    }

    #[test]
    fn test_build_args_dolby_vision() {
        let plan = sample_plan(Path::new("/in/Show.S01E01.mkv"), Path::new("/out"));
        let args = build_args(&plan);

        assert_eq!(value_after(&args, "-i").as_deref(), Some("/in/Show.S01E01.mkv"));
        assert_eq!(value_after(&args, "-c:v").as_deref(), Some("copy"));
        assert_eq!(value_after(&args, "-tag:v").as_deref(), Some("dvh1"));
        assert_eq!(value_after(&args, "-strict").as_deref(), Some("unofficial"));
        assert_eq!(value_after(&args, "-movflags").as_deref(), Some("+faststart"));
        assert_eq!(value_after(&args, "-f").as_deref(), Some("mp4"));
        assert_eq!(args.last().map(String::as_str), Some("/out/Show.S01E01.mp4"));

        let maps: Vec<&str> = args
            .windows(2)
            .filter(|w| w[0] == "-map")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(maps, vec!["0:0", "0:1", "0:2", "0:4", "0:3"]);

        assert_eq!(value_after(&args, "-c:a:0").as_deref(), Some("copy"));
        assert_eq!(value_after(&args, "-disposition:a:0").as_deref(), Some("default"));
        assert_eq!(value_after(&args, "-disposition:a:1").as_deref(), Some("0"));
        assert_eq!(value_after(&args, "-c:s:0").as_deref(), Some("mov_text"));
        assert_eq!(value_after(&args, "-disposition:s:0").as_deref(), Some("default"));
        assert!(args.contains(&"language=spa".to_string()));
    }

    #[test]
    fn test_build_args_hdr_and_transcode() {
        let mut plan = sample_plan(Path::new("/in/a.mkv"), Path::new("/out"));
        plan.dolby_vision = false;
        plan.selected_audio[1].action = StreamAction::Transcode {
            codec: "eac3".to_string(),
            bitrate_kbps: Some(640),
        };
        plan.staging_path = Some(PathBuf::from("/tmp/job/a.mp4"));

        let args = build_args(&plan);
        assert_eq!(value_after(&args, "-tag:v").as_deref(), Some("hvc1"));
        assert!(position_of(&args, "-strict").is_none());
        assert_eq!(value_after(&args, "-c:a:1").as_deref(), Some("eac3"));
        assert_eq!(value_after(&args, "-b:a:1").as_deref(), Some("640k"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/job/a.mp4"));
    }

    #[test]
    fn test_build_args_non_hevc_has_no_tag() {
        let mut plan = sample_plan(Path::new("/in/a.mkv"), Path::new("/out"));
        plan.dolby_vision = false;
        plan.video_codec = "h264".to_string();
        let args = build_args(&plan);
        assert!(position_of(&args, "-tag:v").is_none());
        assert!(position_of(&args, "-strict").is_none());
        assert_eq!(value_after(&args, "-c:v").as_deref(), Some("copy"));

        plan.video_codec = "av1".to_string();
        assert!(position_of(&build_args(&plan), "-tag:v").is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let plan = sample_plan(&dir.path().join("a.mkv"), &dir.path().join("out"));
        let executor = FfmpegExecutor::new(PathBuf::from("/nonexistent/bin/ffmpeg"), 5);

        let result = executor.execute(&plan, CancelSignal::never()).await;
        assert!(!result.success);
        assert!(result.error_detail.unwrap().contains("not found"));
        assert_eq!(result.failed_stage, Some(crate::executor::FailureStage::Conversion));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let plan = sample_plan(&dir.path().join("a.mkv"), &dir.path().join("out"));
        let executor = FfmpegExecutor::new(PathBuf::from("ffmpeg"), 5);
        let handle = CancelHandle::new();
        handle.cancel();

        let result = executor.execute(&plan, handle.signal()).await;
        assert!(!result.success);
        assert!(result.is_cancelled());
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        #[tokio::test]
        async fn test_success_writes_output() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(dir.path(), r#"for last; do :; done; echo mp4 > "$last""#);
            let plan = sample_plan(&dir.path().join("a.mkv"), &dir.path().join("out"));

            let result = FfmpegExecutor::new(script, 10)
                .execute(&plan, CancelSignal::never())
                .await;
            assert!(result.success, "{:?}", result.error_detail);
            assert_eq!(result.exit_code, Some(0));
            assert!(plan.output_path.exists());
            assert_eq!(result.plan.as_ref(), Some(&plan));
        }

        #[tokio::test]
        async fn test_failure_keeps_stderr_tail_and_removes_output() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(
                dir.path(),
                r#"for last; do :; done
echo partial > "$last"
i=0
while [ $i -lt 30 ]; do echo "line $i" >&2; i=$((i+1)); done
echo "Invalid data found when processing input" >&2
exit 3"#,
            );
            let plan = sample_plan(&dir.path().join("a.mkv"), &dir.path().join("out"));

            let result = FfmpegExecutor::new(script, 10)
                .execute(&plan, CancelSignal::never())
                .await;
            assert!(!result.success);
            assert_eq!(result.exit_code, Some(3));
            let detail = result.error_detail.unwrap();
            assert!(detail.contains("Invalid data found"));
            assert!(!detail.contains("line 5\n"));
            assert!(detail.contains("line 29"));
            assert!(!plan.output_path.exists());
        }

        #[tokio::test]
        async fn test_timeout_kills_process() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(dir.path(), "exec sleep 30");
            let plan = sample_plan(&dir.path().join("a.mkv"), &dir.path().join("out"));

            let start = Instant::now();
            let result = FfmpegExecutor::new(script, 1)
                .execute(&plan, CancelSignal::never())
                .await;
            assert!(!result.success);
            assert_eq!(result.error_detail.as_deref(), Some("timed out after 1s"));
            assert!(start.elapsed() < Duration::from_secs(10));
        }

        #[tokio::test]
        async fn test_cancel_kills_process() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(dir.path(), "exec sleep 30");
            let plan = sample_plan(&dir.path().join("a.mkv"), &dir.path().join("out"));
            let handle = CancelHandle::new();

            let canceller = handle.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(200)).await;
                canceller.cancel();
            });

            let start = Instant::now();
            let result = FfmpegExecutor::new(script, 60)
                .execute(&plan, handle.signal())
                .await;
            assert!(result.is_cancelled());
            assert!(start.elapsed() < Duration::from_secs(10));
        }
    }
}
