//! Stream probing.
//!
//! Runs ffprobe against a media file and turns its JSON output into typed
//! [`MediaStreamRecord`]s. Loosely-typed probe output never leaves this
//! module: entries are validated at the boundary and unrecognized stream
//! kinds are quarantined.
//!
//! # Example
//!
//! ```ignore
//! use playdv_core::probe::{FfprobeProbe, StreamProbe};
//!
//! let probe = FfprobeProbe::from_config(&config.processing);
//! let streams = probe.probe(Path::new("/downloads/Show.S01E01.mkv")).await?;
//! println!("{} streams", streams.len());
//! ```

mod error;
mod ffprobe;
mod traits;
mod types;

pub use error::ProbeError;
pub use ffprobe::{parse_probe_output, FfprobeProbe};
pub use traits::StreamProbe;
pub use types::{MediaStreamRecord, SideData, StreamKind};
