//! Torrent eligibility.
//!
//! Decides whether a finished download is worth converting at all, before
//! any file is probed. The decision only looks at the job metadata and the
//! configured filters, so the same job and config always get the same
//! verdict.

mod engine;
mod job;
mod seasons;

pub use engine::{evaluate, is_eligible, FilterVerdict, RejectionReason};
pub use job::TorrentJob;
pub use seasons::{SeasonCount, SeasonMatcher};
