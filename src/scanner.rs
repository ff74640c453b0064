use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into
const DEFAULT_EXCLUDED_DIRS: &[&str] = &["target", "node_modules", "dist", "build"];

/// File scanner for collecting source files under a project root.
///
/// The `FileScanner` recursively walks a directory and collects every file with
/// the configured extension (`rs` by default). Hidden directories (those
/// starting with `.`) and build output directories are skipped.
///
/// # Example
///
/// ```no_run
/// use openapi_synth::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-service"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.source_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extension: String,
    excluded_dirs: Vec<String>,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths of all discovered source files, in walk order
    pub source_files: Vec<PathBuf>,
    /// Warning messages for entries that could not be accessed
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for Rust sources under `root_path`.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The project directory to scan
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            extension: "rs".to_string(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Collects files with a different extension instead.
    ///
    /// # Arguments
    ///
    /// * `extension` - File extension, with or without the leading dot
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// The directory this scanner walks
    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Scans the directory tree and collects matching files.
    ///
    /// Entries are visited in file-name order. The walk skips:
    /// - Hidden directories (starting with `.`)
    /// - Build output directories (`target`, `node_modules`, `dist`, `build`)
    ///
    /// Inaccessible entries are logged and recorded as warnings; scanning
    /// continues past them.
    ///
    /// # Returns
    ///
    /// A `ScanResult` with the matching files and any warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory itself cannot be read.
    pub fn scan(&self) -> Result<ScanResult> {
        std::fs::read_dir(&self.root_path)
            .with_context(|| format!("Cannot read project root: {}", self.root_path.display()))?;

        let mut source_files = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }
                if !e.file_type().is_dir() {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_excluded = self.excluded_dirs.iter().any(|d| *d == file_name);

                !is_hidden && !is_excluded
            });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let matches_extension =
                        path.extension().and_then(|s| s.to_str()) == Some(self.extension.as_str());

                    if path.is_file() && matches_extension {
                        source_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Scanned {}: {} .{} files",
            self.root_path.display(),
            source_files.len(),
            self.extension
        );

        Ok(ScanResult {
            source_files,
            warnings,
        })
    }
}
