//! Event log retention.

use chrono::{Duration, NaiveDate, Utc};
use std::path::Path;
use tracing::{debug, warn};

const LOG_PREFIX: &str = "playdv-";
const LOG_SUFFIX: &str = ".jsonl";

/// Delete daily event logs more than `keep_days` days old. A log dated
/// exactly `keep_days` days before today is kept. Returns how many files
/// were removed.
pub fn prune_old_logs(log_dir: &Path, keep_days: u32) -> std::io::Result<usize> {
    prune_old_logs_at(log_dir, keep_days, Utc::now().date_naive())
}

/// [`prune_old_logs`] relative to a fixed `today`.
pub fn prune_old_logs_at(
    log_dir: &Path,
    keep_days: u32,
    today: NaiveDate,
) -> std::io::Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }
    let cutoff = today - Duration::days(i64::from(keep_days));

    let mut removed = 0;
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(date) = name
            .to_str()
            .and_then(|n| n.strip_prefix(LOG_PREFIX))
            .and_then(|n| n.strip_suffix(LOG_SUFFIX))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };

        if date < cutoff {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(file = %entry.path().display(), "Pruned event log");
                    removed += 1;
                }
                Err(e) => warn!(file = %entry.path().display(), "Failed to prune event log: {}", e),
            }
        }
    }
    Ok(removed)
}
