//! Stream classification.
//!
//! Decides whether a file is Dolby Vision or plain HDR and which audio and
//! subtitle tracks survive the remux. Everything here is pure: the same
//! stream list and language priority always yield the same answer.
//!
//! # Example
//!
//! ```ignore
//! use playdv_core::classifier::{classify, select_audio, select_subtitles};
//!
//! let video = classify(&streams)?;
//! let audio = select_audio(&streams, &config.processing.audio_languages);
//! let subs = select_subtitles(&streams, &config.processing.subtitle_languages, false);
//! ```

mod error;
mod tracks;
mod types;
mod video;

pub use error::ClassificationError;
pub use tracks::{append_unmatched, select_audio, select_subtitles, unmatched_streams};
pub use types::{TrackRole, TrackSelection, VideoClassification};
pub use video::{classify, is_hevc};
