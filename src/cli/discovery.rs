//! Input discovery for the command-line runner.
//!
//! Each input is a sounding file, a directory searched recursively or a
//! glob pattern. Only files with a GEF or XML extension are kept.

use crate::constants::SOUNDING_EXTENSIONS;
use crate::error::{GefError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Resolves command-line inputs to a sorted list of sounding files
#[derive(Debug, Default)]
pub struct FileDiscovery {
    files: BTreeSet<PathBuf>,
    directories: usize,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directories searched so far
    pub fn directory_count(&self) -> usize {
        self.directories
    }

    /// Add one input; fails when it matches nothing on disk
    pub fn add(&mut self, input: &str) -> Result<()> {
        let path = Path::new(input);
        let before = self.files.len();

        if path.is_dir() {
            self.add_directory(path);
        } else if path.is_file() {
            // explicitly named files are taken whatever their extension
            self.files.insert(path.to_path_buf());
        } else if is_pattern(input) {
            self.add_pattern(input)?;
        } else {
            return Err(GefError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: "input does not exist".to_string(),
            });
        }

        debug!(
            "Input '{}' added {} files",
            input,
            self.files.len() - before
        );
        Ok(())
    }

    fn add_directory(&mut self, directory: &Path) {
        self.directories += 1;
        for entry in WalkDir::new(directory)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if entry.file_type().is_file() && is_sounding_file(entry.path()) {
                self.files.insert(entry.into_path());
            }
        }
    }

    fn add_pattern(&mut self, pattern: &str) -> Result<()> {
        let paths = glob::glob(pattern).map_err(|e| GefError::ProcessingFailed {
            path: PathBuf::from(pattern),
            reason: format!("Invalid glob pattern: {}", e),
        })?;
        for path in paths.filter_map(|p| p.ok()) {
            if path.is_dir() {
                self.add_directory(&path);
            } else if is_sounding_file(&path) {
                self.files.insert(path);
            }
        }
        Ok(())
    }

    /// Discovered files in path order
    pub fn into_files(self) -> Vec<PathBuf> {
        self.files.into_iter().collect()
    }
}

/// Discover the sounding files named by `inputs`
pub fn discover_files(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut discovery = FileDiscovery::new();
    for input in inputs {
        discovery.add(input)?;
    }
    debug!("Searched {} directories", discovery.directory_count());
    Ok(discovery.into_files())
}

/// Check if a path has a sounding file extension (case-insensitive)
pub fn is_sounding_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SOUNDING_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
