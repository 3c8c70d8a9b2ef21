use clap::Parser;
use std::path::PathBuf;

/// Remux a finished Dolby Vision download into MP4.
///
/// Meant to run as qBittorrent's "run external program on torrent
/// finished" hook:
///
///     playdv "%N" "%L" "%F" --hash "%I" --size "%Z"
#[derive(Debug, Parser)]
#[command(name = "playdv", version, about)]
pub struct Args {
    /// Torrent name
    #[arg(env = "PLAYDV_TORRENT_NAME")]
    pub name: String,

    /// Torrent category (may be empty)
    #[arg(env = "PLAYDV_CATEGORY")]
    pub category: String,

    /// Content path: the single file or the root directory of the torrent
    #[arg(env = "PLAYDV_CONTENT_PATH")]
    pub content_path: PathBuf,

    /// Info hash, used to ask qBittorrent for the file list and to tag the
    /// torrent with the outcome
    #[arg(long, env = "PLAYDV_HASH")]
    pub hash: Option<String>,

    /// Torrent size in bytes. Summed from the file list when omitted.
    #[arg(long, env = "PLAYDV_SIZE")]
    pub size: Option<u64>,

    /// Configuration file
    #[arg(long, env = "PLAYDV_CONFIG", default_value = "playdv.toml")]
    pub config: PathBuf,

    /// Print the conversion plans as JSON without converting anything
    #[arg(long, env = "PLAYDV_DRY_RUN")]
    pub dry_run: bool,
}
