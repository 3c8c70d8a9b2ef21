//! Season inference from file names.

use regex_lite::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Result of counting seasons across a file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonCount {
    /// Number of distinct seasons. Zero means no file carries a marker.
    Known(usize),
    /// The file could not be attributed to exactly one season.
    Ambiguous { file: PathBuf },
}

/// Compiled season patterns. The first capture group of each pattern holds
/// the season number.
#[derive(Debug, Clone)]
pub struct SeasonMatcher {
    patterns: Vec<Regex>,
}

impl SeasonMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, regex_lite::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Every season number any pattern finds in `text`.
    pub fn seasons_in(&self, text: &str) -> BTreeSet<u32> {
        let mut seasons = BTreeSet::new();
        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                if let Some(season) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                    seasons.insert(season);
                }
            }
        }
        seasons
    }

    /// Seasons for one file: taken from the file name, or from the parent
    /// directory name when the file name has no marker.
    pub fn seasons_for(&self, path: &Path) -> BTreeSet<u32> {
        let from_name = path
            .file_name()
            .map(|n| self.seasons_in(&n.to_string_lossy()))
            .unwrap_or_default();
        if !from_name.is_empty() {
            return from_name;
        }
        path.parent()
            .and_then(Path::file_name)
            .map(|n| self.seasons_in(&n.to_string_lossy()))
            .unwrap_or_default()
    }

    /// Count distinct seasons across `files`.
    ///
    /// A file naming two different seasons is ambiguous. With more than one
    /// file, a file without any marker is ambiguous too. A lone file without
    /// a marker is a movie and counts as zero seasons.
    pub fn count(&self, files: &[PathBuf]) -> SeasonCount {
        let mut seasons = BTreeSet::new();
        for file in files {
            let found = self.seasons_for(file);
            match found.len() {
                0 if files.len() > 1 => {
                    return SeasonCount::Ambiguous { file: file.clone() };
                }
                0 => {}
                1 => seasons.extend(found),
                _ => return SeasonCount::Ambiguous { file: file.clone() },
            }
        }
        SeasonCount::Known(seasons.len())
    }
}
