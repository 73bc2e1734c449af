//! Viewer configuration loaded from a JSON file

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use super::reference_names::ReferenceNames;
use crate::DataError;

/// Environment variable naming the primary data directory
pub const DATA_DIR_ENV: &str = "H5_DATA_DIR";
/// Environment variable naming an additional search directory
pub const SEARCH_DIR_ENV: &str = "H5_SEARCH_DIR";

/// Full viewer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoilViewConfig {
    pub locator: LocatorConfig,
    pub scanner: ScannerConfig,
    pub loader: LoaderConfig,
    pub navigation: NavigationConfig,
}

/// File discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocatorConfig {
    /// Directories searched in priority order
    pub search_dirs: Vec<PathBuf>,

    /// File extension to match, without the dot
    pub extension: String,

    /// Files smaller than this are rejected
    pub min_file_size: u64,

    /// Upper bound on files offered for display
    pub max_display_files: usize,

    /// Filename fragments that get a file into the priority bucket
    pub priority_keywords: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            search_dirs: vec![
                PathBuf::from("./data"),
                PathBuf::from("./valid"),
                PathBuf::from("./input"),
                PathBuf::from("."),
            ],
            extension: "h5".to_string(),
            min_file_size: 1024,
            max_display_files: 15,
            priority_keywords: vec![
                "test.h5".to_string(),
                "sample".to_string(),
                "data".to_string(),
                "coil".to_string(),
                "main".to_string(),
                "primary".to_string(),
            ],
        }
    }
}

/// Coil detection heuristics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerConfig {
    /// Token a path segment must contain to mark a coil (case-insensitive)
    pub marker_token: String,

    /// Segments this long or longer are not coil markers
    pub max_segment_len: usize,

    /// Inclusive range of purely numeric segments accepted as coils
    pub numeric_min: u64,
    pub numeric_max: u64,

    /// Dataset names of the two measured axes
    pub x_name: String,
    pub z_name: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            marker_token: "coil".to_string(),
            max_segment_len: 20,
            numeric_min: 50,
            numeric_max: 60,
            x_name: "x".to_string(),
            z_name: "z".to_string(),
        }
    }
}

/// Dataset loading settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderConfig {
    pub reference: ReferenceNames,

    /// Use the column mean of measured curves when no reference exists.
    /// Such references are tagged synthetic on the loaded series.
    pub allow_synthetic_reference: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceNames::default(),
            allow_synthetic_reference: true,
        }
    }
}

/// Navigation defaults handed to the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NavigationConfig {
    pub rows_per_page: usize,
    pub auto_advance_interval_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            rows_per_page: cv_core::navigation::DEFAULT_ROWS_PER_PAGE,
            auto_advance_interval_ms: 2000,
        }
    }
}

impl CoilViewConfig {
    /// Load configuration from a JSON file; missing sections use defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let file = File::open(path.as_ref())?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Apply `H5_DATA_DIR` and `H5_SEARCH_DIR` from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply directory overrides from an arbitrary lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let dirs = &mut self.locator.search_dirs;
        if let Some(primary) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            dirs.insert(0, PathBuf::from(primary));
        }
        if let Some(extra) = lookup(SEARCH_DIR_ENV).filter(|v| !v.is_empty()) {
            dirs.push(PathBuf::from(extra));
        }

        let mut seen = Vec::with_capacity(dirs.len());
        dirs.retain(|dir| {
            if seen.contains(dir) {
                false
            } else {
                seen.push(dir.clone());
                true
            }
        });
        self
    }
}
