//! File discovery, schema scanning and coil loading for the measurement viewer

pub mod cache;
pub mod catalog;
pub mod config;
pub mod index;
pub mod loader;
pub mod locator;
pub mod reference;
pub mod schema;
pub mod sources;
pub mod table;

use std::path::PathBuf;

use arrow::error::ArrowError;
use cv_core::DataKind;
use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use cache::BlankInfoCache;
pub use catalog::Catalog;
pub use config::CoilViewConfig;
pub use index::{CoilRange, RangeAllocator};
pub use loader::DatasetLoader;
pub use locator::{CandidateFile, FileLocator};
pub use schema::SchemaScanner;
pub use sources::{CoilFileSource, FileOpener, HierarchicalFile, JsonTreeOpener, MemoryTree};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not readable: {path}: {details}")]
    FileNotReadable { path: PathBuf, details: String },

    #[error("Empty or too small file: {path}: {reason}")]
    EmptyOrTooSmallFile { path: PathBuf, reason: String },

    #[error("No coils found in {path}")]
    NoCoilsFound { path: PathBuf },

    #[error("No data for coil {coil}")]
    NoDataForCoil { coil: String },

    #[error("Missing or mismatched reference for {kind}: ref_x={x_len:?}, ref_z={z_len:?}")]
    MissingOrMismatchedReference {
        kind: DataKind,
        x_len: Option<usize>,
        z_len: Option<usize>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No usable data in any discovered file")]
    NoUsableData,

    #[error("Format error: {0}")]
    Format(String),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        match error.classify() {
            serde_json::error::Category::Io => {
                DataError::Io(std::io::Error::new(std::io::ErrorKind::Other, error.to_string()))
            }
            _ => DataError::Format(error.to_string()),
        }
    }
}
