mod args;
mod source;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use playdv_core::{
    create_event_system, evaluate,
    events::{prune_old_logs, EventSink, JsonLinesSink, TracingSink},
    load_config, validate_config, AppConfig, BatchOrchestrator, CancelHandle, EventHandle,
    FfmpegExecutor, FfprobeProbe, FilterVerdict, JobStatus, PipelineEvent, QBittorrentClient,
    SanitizedConfig, TorrentClient, TorrentJob,
};

use args::Args;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the pipeline event channel
const EVENT_BUFFER_SIZE: usize = 256;

const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_CONFIG: i32 = 2;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_validated_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info", false);
            error!("{:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    init_tracing(&config.logging.level, config.logging.json);

    match run(args, config).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(EXIT_FAILED);
        }
    }
}

fn load_validated_config(path: &Path) -> Result<AppConfig> {
    let config = load_config(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

/// Logs go to stderr so dry-run output on stdout stays machine readable.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .try_init();
}

async fn run(args: Args, config: AppConfig) -> Result<i32> {
    info!(version = VERSION, torrent = %args.name, category = %args.category, "playdv starting");
    info!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    match prune_old_logs(&config.paths.log_dir, config.logging.keep_days) {
        Ok(0) => {}
        Ok(removed) => info!(removed, "Pruned old event logs"),
        Err(e) => warn!("Failed to prune event logs: {}", e),
    }

    let client = match args.hash {
        Some(_) => match QBittorrentClient::new(&config.qbittorrent) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("qBittorrent client unavailable: {}", e);
                None
            }
        },
        None => None,
    };
    let client_ref = client.as_ref().map(|c| c as &dyn TorrentClient);

    let job = source::resolve_job(&args, client_ref).await?;

    let sink: Arc<dyn EventSink> = match JsonLinesSink::new(&config.paths.log_dir) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            warn!(
                log_dir = %config.paths.log_dir.display(),
                "Event log unavailable, using console: {}", e
            );
            Arc::new(TracingSink)
        }
    };
    let (events, writer) = create_event_system(vec![sink], EVENT_BUFFER_SIZE);
    let writer_task = tokio::spawn(writer.run());

    let result = process(&args, job, config, client_ref, events).await;

    if let Err(e) = writer_task.await {
        warn!("Event writer stopped abnormally: {}", e);
    }
    result
}

async fn process(
    args: &Args,
    job: TorrentJob,
    config: AppConfig,
    client: Option<&dyn TorrentClient>,
    events: EventHandle,
) -> Result<i32> {
    if let FilterVerdict::Rejected(reason) = evaluate(&job, &config) {
        info!(torrent = %job.name, %reason, "Torrent skipped");
        events
            .emit(PipelineEvent::JobFiltered {
                job_name: job.name.clone(),
                reason: reason.to_string(),
            })
            .await;
        return Ok(EXIT_OK);
    }

    let config = Arc::new(config);
    let orchestrator = BatchOrchestrator::new(
        Arc::new(FfprobeProbe::from_config(&config.processing)),
        Arc::new(FfmpegExecutor::from_config(&config.processing)),
        Arc::clone(&config),
    );

    if args.dry_run {
        return dry_run(&orchestrator, &job, &config).await;
    }

    let orchestrator = orchestrator.with_events(events.clone());
    let cancel_task = tokio::spawn(cancel_on_signal(orchestrator.cancel_handle()));
    let report = orchestrator.run(&job).await;
    cancel_task.abort();
    let report = report?;

    if let (Some(client), Some(hash)) = (client, job.hash.as_deref()) {
        let tag = report.status.tag();
        match client.add_tags(hash, &[tag]).await {
            Ok(()) => {
                info!(hash, tag, "Tagged torrent");
                events
                    .emit(PipelineEvent::TorrentTagged {
                        hash: hash.to_string(),
                        tag: tag.to_string(),
                    })
                    .await;
            }
            Err(e) => warn!(hash, tag, "Failed to tag torrent: {}", e),
        }
    }

    for failure in report.failures() {
        warn!(
            file = %failure.source_path.display(),
            stage = failure.failed_stage.map(|s| s.as_str()).unwrap_or("unknown"),
            detail = failure.error_detail.as_deref().unwrap_or(""),
            "File not converted"
        );
    }

    match report.status {
        JobStatus::Success => {
            info!(converted = report.succeeded(), "All files converted");
            Ok(EXIT_OK)
        }
        JobStatus::Partial => {
            warn!(
                converted = report.succeeded(),
                failed = report.failed(),
                "Some files were not converted"
            );
            Ok(EXIT_OK)
        }
        JobStatus::Failed => {
            error!(failed = report.failed(), "No file was converted");
            Ok(EXIT_FAILED)
        }
    }
}

/// Print one JSON entry per media file: its plan, or why planning failed.
async fn dry_run(
    orchestrator: &BatchOrchestrator<FfprobeProbe, FfmpegExecutor>,
    job: &TorrentJob,
    config: &AppConfig,
) -> Result<i32> {
    let mut entries = Vec::new();
    for file in job.media_files(&config.filters) {
        let entry = match orchestrator.plan_file(job, &file).await {
            Ok(plan) => serde_json::json!({ "file": file, "plan": plan }),
            Err(e) => serde_json::json!({
                "file": file,
                "stage": e.stage().as_str(),
                "error": e.to_string(),
            }),
        };
        entries.push(entry);
    }

    let output = serde_json::to_string_pretty(&entries).context("Failed to serialize plans")?;
    println!("{}", output);
    Ok(EXIT_OK)
}

/// Cancel the batch on Ctrl+C or SIGTERM.
async fn cancel_on_signal(cancel: CancelHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown requested, cancelling conversions");
    cancel.cancel();
}
