//! Download-client abstraction.
//!
//! The entry point talks to the download client twice: before a batch to
//! resolve a torrent's files, and after it to tag the torrent with the
//! outcome. Neither call is allowed to abort the batch.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
