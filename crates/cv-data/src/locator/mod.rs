//! Discovery of measurement files on disk

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::LocatorConfig;
use crate::sources::FileOpener;
use crate::DataError;

/// A file found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub valid: bool,
    /// File name shown to users and used for lookups
    pub display_name: String,
    /// Why the file was rejected
    pub reason: Option<String>,
}

/// Finds, validates and ranks measurement files
pub struct FileLocator {
    config: LocatorConfig,
    opener: Arc<dyn FileOpener>,
    /// Valid files from the latest discovery, sorted
    latest: RwLock<Option<Vec<CandidateFile>>>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl FileLocator {
    pub fn new(config: LocatorConfig, opener: Arc<dyn FileOpener>) -> Self {
        Self {
            config,
            opener,
            latest: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn opener(&self) -> &Arc<dyn FileOpener> {
        &self.opener
    }

    /// Discover in the configured search directories
    pub fn discover(&self) -> Vec<CandidateFile> {
        let dirs = self.config.search_dirs.clone();
        self.discover_in(&dirs)
    }

    /// Discover valid files in `dirs`, scanned in the given priority order.
    ///
    /// The first valid file with a given name wins; the result is sorted
    /// case-insensitively by name and remembered for [`resolve`](Self::resolve).
    pub fn discover_in(&self, dirs: &[PathBuf]) -> Vec<CandidateFile> {
        let candidates = self.scan(dirs);

        let mut claimed = HashSet::new();
        let mut files: Vec<CandidateFile> = Vec::new();
        for candidate in candidates {
            if !candidate.valid {
                warn!(
                    "Skipping invalid file {}: {}",
                    candidate.path.display(),
                    candidate.reason.as_deref().unwrap_or("unknown")
                );
                continue;
            }
            if !claimed.insert(candidate.display_name.clone()) {
                debug!("Skipping duplicate: {}", candidate.path.display());
                continue;
            }
            info!("Found file {} at {}", candidate.display_name, candidate.path.display());
            files.push(candidate);
        }

        files.sort_by_key(|f| f.display_name.to_lowercase());
        info!("Total unique files found: {}", files.len());

        *self.latest.write() = Some(files.clone());
        files
    }

    /// Every matching file in `dirs` with its validation result, in
    /// directory order
    pub fn scan(&self, dirs: &[PathBuf]) -> Vec<CandidateFile> {
        let mut seen_dirs = HashSet::new();
        let mut paths = Vec::new();

        for dir in dirs {
            if !seen_dirs.insert(dir.clone()) || !dir.is_dir() {
                continue;
            }
            match self.matching_files(dir) {
                Ok(mut found) => {
                    found.sort();
                    paths.extend(found);
                }
                Err(e) => warn!("Error searching in {}: {}", dir.display(), e),
            }
        }
        debug!("Validating {} candidate files", paths.len());

        paths
            .into_par_iter()
            .map(|path| {
                let reason = self.validate(&path).err().map(|e| e.to_string());
                CandidateFile {
                    display_name: display_name(&path),
                    valid: reason.is_none(),
                    reason,
                    path,
                }
            })
            .collect()
    }

    fn matching_files(&self, dir: &Path) -> Result<Vec<PathBuf>, DataError> {
        let wanted = OsStr::new(&self.config.extension);
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension() == Some(wanted) {
                found.push(path);
            }
        }
        Ok(found)
    }

    /// Check size and top-level structure of one file
    pub fn validate(&self, path: &Path) -> Result<(), DataError> {
        let size = fs::metadata(path)?.len();
        if size < self.config.min_file_size {
            return Err(DataError::EmptyOrTooSmallFile {
                path: path.to_path_buf(),
                reason: format!("{} bytes, minimum is {}", size, self.config.min_file_size),
            });
        }

        let file = self.opener.open(path)?;
        let top_level = file.list_children("").map_err(|e| DataError::FileNotReadable {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        if top_level.is_empty() {
            return Err(DataError::EmptyOrTooSmallFile {
                path: path.to_path_buf(),
                reason: "no top-level groups".to_string(),
            });
        }
        Ok(())
    }

    /// Path for a display name from the latest discovery.
    ///
    /// Runs discovery first if none has happened yet.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf, DataError> {
        let has_results = self.latest.read().is_some();
        if !has_results {
            self.discover();
        }
        self.latest
            .read()
            .iter()
            .flatten()
            .find(|f| f.display_name == file_name)
            .map(|f| f.path.clone())
            .ok_or_else(|| DataError::NotFound(file_name.to_string()))
    }

    /// Display names to offer: discovered, capped and deduplicated
    pub fn locate_files(&self) -> Vec<String> {
        let files: Vec<PathBuf> = self.discover().into_iter().map(|f| f.path).collect();
        let shown = filter_for_display(
            &files,
            self.config.max_display_files,
            &self.config.priority_keywords,
        );

        let mut names: Vec<String> = Vec::with_capacity(shown.len());
        for path in shown {
            let name = display_name(&path);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Cap a file list at `max_count`, favouring names that contain one of
/// `keywords`.
///
/// Half of the slots go to keyword matches and half to the rest; any slots
/// left over are filled from `files` in order.
pub fn filter_for_display(files: &[PathBuf], max_count: usize, keywords: &[String]) -> Vec<PathBuf> {
    if files.len() <= max_count {
        return files.to_vec();
    }

    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    let (priority, regular): (Vec<&PathBuf>, Vec<&PathBuf>) = files.iter().partition(|path| {
        let name = display_name(path).to_lowercase();
        keywords.iter().any(|k| name.contains(k.as_str()))
    });

    let half = max_count / 2;
    let mut selected: Vec<PathBuf> = priority
        .into_iter()
        .take(half)
        .chain(regular.into_iter().take(half))
        .cloned()
        .collect();

    for path in files {
        if selected.len() >= max_count {
            break;
        }
        if !selected.contains(path) {
            selected.push(path.clone());
        }
    }
    selected.truncate(max_count);
    selected
}
