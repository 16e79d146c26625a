//! Assessment file discovery for batch runs.
//!
//! Walks a directory for saved assessments, honouring the configured
//! extensions, excludes, and size limits.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for assessment scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (e.g., ["json"])
    pub extensions: Vec<String>,
    /// Names to exclude (e.g., ["node_modules", "reports"])
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum number of files to return
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["json".to_string()],
            excludes: Vec::new(),
            max_file_size: 1024 * 1024,
            max_files: None,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: Some(config.max_files),
        }
    }
}

/// A discovered assessment file.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Path relative to the scan root
    pub relative: String,
    /// File size in bytes
    pub size: u64,
}

/// Scanner for assessment files below a root directory.
pub struct AssessmentScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl AssessmentScanner {
    /// Create a new scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Scan for matching files, sorted by path.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if !self.root.is_dir() {
            return Err(anyhow::anyhow!(
                "Not a directory: {}",
                self.root.display()
            ));
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e));

        for entry in walker {
            if let Some(max) = self.config.max_files {
                if files.len() >= max {
                    debug!("Reached max_files limit of {}", max);
                    break;
                }
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                continue;
            }

            let size = entry
                .metadata()
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?
                .len();

            if size > self.config.max_file_size {
                warn!(
                    "Skipping {} ({} bytes exceeds limit)",
                    entry.path().display(),
                    size
                );
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();

            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                relative,
                size,
            });
        }

        debug!("Found {} assessment files in {}", files.len(), self.root.display());
        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    /// Check if an entry matches exclusion patterns.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();

        // Hidden files
        if name.starts_with('.') {
            return true;
        }

        self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }
}
