//! Project snapshot: a shallow inventory of a directory.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

/// File name suffixes listed in a snapshot.
pub const SOURCE_EXTENSIONS: [&str; 3] = [".py", ".js", ".ts"];

/// Entry counts for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    /// Number of entries in the directory, whatever their name.
    pub file_count: usize,
}

/// Inventory of one directory.
///
/// `files` only lists source-like entries while `metrics.file_count` counts
/// every entry, so the two usually differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Directory that was listed.
    pub directory: String,
    /// Names ending in one of [`SOURCE_EXTENSIONS`], sorted.
    pub files: Vec<String>,
    /// Entry counts.
    pub metrics: SnapshotMetrics,
}

impl ProjectSnapshot {
    /// Read `dir` once and build its snapshot.
    ///
    /// # Errors
    /// Returns error if the directory cannot be listed.
    pub fn capture(dir: &Path) -> io::Result<Self> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }

        let file_count = names.len();
        let mut files: Vec<String> = names.into_iter().filter(|n| is_source_file(n)).collect();
        files.sort();

        Ok(Self {
            directory: dir.display().to_string(),
            files,
            metrics: SnapshotMetrics { file_count },
        })
    }

    /// Total entry count.
    #[must_use]
    pub const fn file_count(&self) -> usize {
        self.metrics.file_count
    }

    /// Serialize to the JSON payload sent to the controller.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn is_source_file(name: &str) -> bool {
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}
