//! Output placement.
//!
//! Moves a finished output from its staging location to its destination so
//! the destination never holds a partially written file. A same-filesystem
//! move is a plain rename; across filesystems the file is copied next to the
//! destination first and renamed into place.

mod error;
mod fs;

pub use error::PlacerError;
pub use fs::{delete_source, discard, place, PlacementMethod};
