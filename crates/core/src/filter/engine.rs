//! Eligibility rules.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt;
use std::path::PathBuf;

use crate::config::AppConfig;

use super::job::TorrentJob;
use super::seasons::{SeasonCount, SeasonMatcher};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

static UHD_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|[^a-z0-9])(2160p|4k|uhd)([^a-z0-9]|$)").expect("valid UHD regex")
});

static DV_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|[^a-z0-9])(dv|dovi|dolby[ ._-]?vision)([^a-z0-9]|$)")
        .expect("valid Dolby Vision regex")
});

/// Why a job was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    ExcludedCategory { category: String },
    NoMediaFiles,
    TooSmall { size_bytes: u64, min_bytes: u64 },
    Not4k,
    NotDolbyVision,
    TooManySeasons { count: usize, max: u32 },
    AmbiguousSeasons { file: PathBuf },
    InvalidSeasonPattern { reason: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludedCategory { category } => write!(f, "category {:?} is excluded", category),
            Self::NoMediaFiles => write!(f, "no file has an allowed extension"),
            Self::TooSmall {
                size_bytes,
                min_bytes,
            } => write!(f, "size {} bytes is below the minimum {} bytes", size_bytes, min_bytes),
            Self::Not4k => write!(f, "no 2160p/4K/UHD marker"),
            Self::NotDolbyVision => write!(f, "no Dolby Vision marker"),
            Self::TooManySeasons { count, max } => {
                write!(f, "{} seasons exceeds the limit of {}", count, max)
            }
            Self::AmbiguousSeasons { file } => {
                write!(f, "cannot infer a single season for {}", file.display())
            }
            Self::InvalidSeasonPattern { reason } => {
                write!(f, "invalid season pattern: {}", reason)
            }
        }
    }
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterVerdict {
    Eligible,
    Rejected(RejectionReason),
}

impl FilterVerdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, FilterVerdict::Eligible)
    }
}

/// Whether a job should be converted.
pub fn is_eligible(job: &TorrentJob, config: &AppConfig) -> bool {
    evaluate(job, config).is_eligible()
}

/// Evaluate every filter against a job, stopping at the first rejection.
pub fn evaluate(job: &TorrentJob, config: &AppConfig) -> FilterVerdict {
    let filters = &config.filters;

    if filters
        .excluded_categories
        .iter()
        .any(|c| c.trim().eq_ignore_ascii_case(job.category.trim()))
    {
        return FilterVerdict::Rejected(RejectionReason::ExcludedCategory {
            category: job.category.clone(),
        });
    }

    let media = job.media_files(filters);
    if media.is_empty() {
        return FilterVerdict::Rejected(RejectionReason::NoMediaFiles);
    }

    let min_bytes = (config.processing.min_file_size_gb * BYTES_PER_GB).ceil() as u64;
    if job.size_bytes < min_bytes {
        return FilterVerdict::Rejected(RejectionReason::TooSmall {
            size_bytes: job.size_bytes,
            min_bytes,
        });
    }

    let mut labels = vec![job.name.clone()];
    labels.extend(
        media
            .iter()
            .filter_map(|f| f.file_name())
            .map(|n| n.to_string_lossy().into_owned()),
    );
    if filters.require_4k && !labels.iter().any(|l| UHD_MARKER.is_match(l)) {
        return FilterVerdict::Rejected(RejectionReason::Not4k);
    }
    if filters.require_dv && !labels.iter().any(|l| DV_MARKER.is_match(l)) {
        return FilterVerdict::Rejected(RejectionReason::NotDolbyVision);
    }

    let matcher = match SeasonMatcher::new(&filters.season_patterns) {
        Ok(matcher) => matcher,
        Err(e) => {
            return FilterVerdict::Rejected(RejectionReason::InvalidSeasonPattern {
                reason: e.to_string(),
            })
        }
    };
    match matcher.count(&media) {
        SeasonCount::Ambiguous { file } => {
            FilterVerdict::Rejected(RejectionReason::AmbiguousSeasons { file })
        }
        SeasonCount::Known(count) if count > filters.max_seasons_per_torrent as usize => {
            FilterVerdict::Rejected(RejectionReason::TooManySeasons {
                count,
                max: filters.max_seasons_per_torrent,
            })
        }
        SeasonCount::Known(_) => FilterVerdict::Eligible,
    }
}
