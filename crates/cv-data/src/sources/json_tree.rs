//! JSON snapshots of hierarchical files

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::memory_tree::{MemoryTree, TreeNode};
use super::{FileOpener, HierarchicalFile};
use crate::DataError;

/// Opens files holding a serialized [`MemoryTree`]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTreeOpener;

impl JsonTreeOpener {
    pub fn new() -> Self {
        Self
    }

    /// Read a snapshot into memory. The file handle is closed on return.
    pub fn read_tree(path: &Path) -> Result<MemoryTree, DataError> {
        let not_readable = |details: String| DataError::FileNotReadable {
            path: path.to_path_buf(),
            details,
        };

        let file = File::open(path).map_err(|e| not_readable(e.to_string()))?;
        let root: TreeNode =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| not_readable(e.to_string()))?;
        MemoryTree::from_root(root).map_err(|e| not_readable(e.to_string()))
    }
}

impl FileOpener for JsonTreeOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn HierarchicalFile>, DataError> {
        let tree = Self::read_tree(path)?;
        tracing::debug!("Opened snapshot {}", path.display());
        Ok(Box::new(tree))
    }
}
