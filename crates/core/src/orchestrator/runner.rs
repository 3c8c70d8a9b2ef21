//! Batch runner.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::classifier::{append_unmatched, classify, select_audio, select_subtitles};
use crate::config::AppConfig;
use crate::events::{EventHandle, PipelineEvent};
use crate::executor::{
    CancelHandle, CancelSignal, ConversionExecutor, ConversionResult, FailureStage,
};
use crate::filter::TorrentJob;
use crate::placer::{delete_source, discard, place};
use crate::planner::{job_key, output_targets, plan, ConversionPlan, PlanningError};
use crate::probe::{StreamKind, StreamProbe};

use super::types::{BatchReport, JobStatus, OrchestratorError, PipelineError};

/// Runs every media file of a torrent through the conversion pipeline.
pub struct BatchOrchestrator<P, E> {
    probe: Arc<P>,
    executor: Arc<E>,
    config: Arc<AppConfig>,
    events: Option<EventHandle>,
    cancel: CancelHandle,
}

impl<P, E> Clone for BatchOrchestrator<P, E> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
            executor: Arc::clone(&self.executor),
            config: Arc::clone(&self.config),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<P, E> BatchOrchestrator<P, E>
where
    P: StreamProbe + 'static,
    E: ConversionExecutor + 'static,
{
    pub fn new(probe: Arc<P>, executor: Arc<E>, config: Arc<AppConfig>) -> Self {
        Self {
            probe,
            executor,
            config,
            events: None,
            cancel: CancelHandle::new(),
        }
    }

    /// Emit pipeline events through `events`.
    pub fn with_events(mut self, events: EventHandle) -> Self {
        self.events = Some(events);
        self
    }

    /// Handle that cancels queued and running pipelines of this orchestrator.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            events.emit(event).await;
        }
    }

    /// Probe, classify and plan one file without converting it.
    pub async fn plan_file(
        &self,
        job: &TorrentJob,
        path: &Path,
    ) -> Result<ConversionPlan, PipelineError> {
        self.build_plan(path, &job_key(&job.name, &job.content_path))
            .await
    }

    async fn build_plan(&self, path: &Path, key: &str) -> Result<ConversionPlan, PipelineError> {
        let processing = &self.config.processing;

        let streams = self.probe.probe(path).await?;
        self.emit(PipelineEvent::FileProbed {
            file: path.to_path_buf(),
            stream_count: streams.len(),
        })
        .await;

        let classification = classify(&streams)?;
        self.emit(PipelineEvent::FileClassified {
            file: path.to_path_buf(),
            dolby_vision: classification.is_dolby_vision,
            hdr: classification.is_hdr,
            dv_profile: classification.dv_profile,
        })
        .await;

        let mut audio = select_audio(&streams, &processing.audio_languages);
        let mut subtitles = select_subtitles(
            &streams,
            &processing.subtitle_languages,
            processing.prefer_sdh_subtitles,
        );
        if processing.keep_unmatched_tracks {
            append_unmatched(&mut audio, &streams, StreamKind::Audio, &processing.audio_languages);
            append_unmatched(
                &mut subtitles,
                &streams,
                StreamKind::Subtitle,
                &processing.subtitle_languages,
            );
        }

        let plan = plan(path, &classification, &audio, &subtitles, &self.config, key)?;
        self.emit(PipelineEvent::FilePlanned {
            file: path.to_path_buf(),
            output: plan.output_path.clone(),
            audio_tracks: plan.selected_audio.len(),
            subtitle_tracks: plan.selected_subtitles.len(),
        })
        .await;

        Ok(plan)
    }

    async fn process_file(
        &self,
        path: PathBuf,
        key: String,
        cancel: CancelSignal,
    ) -> ConversionResult {
        let start = Instant::now();

        if cancel.is_cancelled() {
            return self
                .fail(&path, None, PipelineError::Cancelled, start)
                .await;
        }

        let plan = match self.build_plan(&path, &key).await {
            Ok(plan) => plan,
            Err(e) => return self.fail(&path, None, e, start).await,
        };

        let result = self.executor.execute(&plan, cancel).await;
        if !result.success {
            warn!(
                file = %path.display(),
                exit_code = ?result.exit_code,
                detail = result.error_detail.as_deref().unwrap_or(""),
                "Conversion failed"
            );
            self.emit(PipelineEvent::FileFailed {
                file: path.clone(),
                stage: FailureStage::Conversion.as_str().to_string(),
                detail: result.error_detail.clone().unwrap_or_default(),
            })
            .await;
            return result;
        }

        let placement = match &plan.staging_path {
            Some(staging) => match place(staging, &plan.output_path).await {
                Ok(method) => method.as_str(),
                Err(e) => {
                    discard(staging).await;
                    return self.fail(&path, Some(plan.clone()), e.into(), start).await;
                }
            },
            None => "direct",
        };

        info!(
            file = %path.display(),
            output = %plan.output_path.display(),
            duration_secs = result.duration_secs,
            placement,
            "File converted"
        );
        self.emit(PipelineEvent::FileConverted {
            file: path,
            output: plan.output_path.clone(),
            duration_secs: result.duration_secs,
        })
        .await;

        result
    }

    async fn fail(
        &self,
        path: &Path,
        plan: Option<ConversionPlan>,
        error: PipelineError,
        start: Instant,
    ) -> ConversionResult {
        let stage = error.stage();
        let detail = error.to_string();
        warn!(file = %path.display(), stage = stage.as_str(), %detail, "File failed");
        self.emit(PipelineEvent::FileFailed {
            file: path.to_path_buf(),
            stage: stage.as_str().to_string(),
            detail: detail.clone(),
        })
        .await;

        let mut result = ConversionResult::failure(path, stage, detail)
            .with_duration(start.elapsed().as_secs_f64());
        result.plan = plan;
        result
    }

    /// Convert every media file of `job`.
    ///
    /// Only an empty media list is an error. Results come back in
    /// file-list order, and with `delete_after_success` only the sources of
    /// successful files are removed, after every pipeline has finished. A
    /// file whose output or staging path matches an earlier file's fails at
    /// planning without being probed.
    pub async fn run(&self, job: &TorrentJob) -> Result<BatchReport, OrchestratorError> {
        let media = job.media_files(&self.config.filters);
        if media.is_empty() {
            return Err(OrchestratorError::NoMediaFiles {
                job_name: job.name.clone(),
            });
        }

        let key = job_key(&job.name, &job.content_path);
        let parallel = self.config.processing.parallel_episodes.max(1);
        info!(
            job = %job.name,
            files = media.len(),
            parallel,
            "Starting batch"
        );
        self.emit(PipelineEvent::JobStarted {
            job_name: job.name.clone(),
            category: job.category.clone(),
            file_count: media.len(),
        })
        .await;

        let collisions = self.output_collisions(&media, &key);
        let semaphore = Arc::new(Semaphore::new(parallel));
        let handles = media.iter().zip(collisions).map(|(path, collision)| {
            let this = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let path = path.clone();
            let key = key.clone();
            let signal = self.cancel.signal();
            tokio::spawn(async move {
                if let Some(error) = collision {
                    return this.fail(&path, None, error.into(), Instant::now()).await;
                }
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ConversionResult::failure(
                            &path,
                            FailureStage::Conversion,
                            "worker pool closed",
                        )
                    }
                };
                this.process_file(path, key, signal).await
            })
        });

        let results: Vec<ConversionResult> = join_all(handles)
            .await
            .into_iter()
            .zip(&media)
            .map(|(joined, path)| {
                joined.unwrap_or_else(|e| {
                    ConversionResult::failure(
                        path,
                        FailureStage::Conversion,
                        format!("pipeline task failed: {}", e),
                    )
                })
            })
            .collect();

        let deleted_sources = if self.config.processing.delete_after_success {
            self.delete_successful_sources(&results).await
        } else {
            Vec::new()
        };

        if self.config.processing.use_temp_dir {
            let staging_dir = self.config.processing.temp_dir.join(&key);
            if tokio::fs::remove_dir(&staging_dir).await.is_ok() {
                debug!(dir = %staging_dir.display(), "Removed staging directory");
            }
        }

        let report = BatchReport {
            job_name: job.name.clone(),
            status: JobStatus::from_results(&results),
            results,
            deleted_sources,
        };

        info!(
            job = %report.job_name,
            status = report.status.as_str(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch finished"
        );
        self.emit(PipelineEvent::JobFinished {
            job_name: report.job_name.clone(),
            status: report.status.as_str().to_string(),
            succeeded: report.succeeded(),
            failed: report.failed(),
        })
        .await;

        Ok(report)
    }

    /// Rejection for every file whose output or staging path was already
    /// claimed by an earlier file of the batch, in file-list order.
    fn output_collisions(&self, media: &[PathBuf], key: &str) -> Vec<Option<PlanningError>> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        media
            .iter()
            .map(|path| {
                // Unplannable names fail later with their own error.
                let (output, staging) = output_targets(path, &self.config, key).ok()?;
                let targets: Vec<PathBuf> = std::iter::once(output).chain(staging).collect();
                if let Some(owner) = targets.iter().find_map(|t| claimed.get(t)) {
                    return Some(PlanningError::rejected(format!(
                        "{} would write the same output as {}",
                        path.display(),
                        owner.display()
                    )));
                }
                for target in targets {
                    claimed.insert(target, path.as_path());
                }
                None
            })
            .collect()
    }

    async fn delete_successful_sources(&self, results: &[ConversionResult]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let shared: HashSet<&PathBuf> = results
            .iter()
            .filter_map(|r| r.plan.as_ref())
            .map(|p| &p.output_path)
            .filter(|output| !seen.insert(*output))
            .collect();

        let mut deleted = Vec::new();
        for result in results.iter().filter(|r| r.success) {
            let source = &result.source_path;
            let Some(output) = result.plan.as_ref().map(|p| &p.output_path) else {
                continue;
            };
            if output == source {
                continue;
            }
            if shared.contains(output) {
                warn!(
                    file = %source.display(),
                    output = %output.display(),
                    "Keeping source, its output is shared with another file"
                );
                continue;
            }

            match delete_source(source).await {
                Ok(()) => {
                    info!(file = %source.display(), "Deleted source");
                    self.emit(PipelineEvent::SourceDeleted {
                        file: source.clone(),
                    })
                    .await;
                    deleted.push(source.clone());
                }
                Err(e) => warn!(file = %source.display(), error = %e, "Failed to delete source"),
            }
        }
        deleted
    }
}
