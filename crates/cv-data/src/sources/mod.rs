//! Access to hierarchical measurement files
//!
//! The reader itself lives outside this crate. Everything here talks to it
//! through [`HierarchicalFile`]: list the children of a path, read an array,
//! read an attribute. Paths are `/`-joined segments without a leading slash;
//! the root group is the empty path.

pub mod coil_file_source;
pub mod json_tree;
pub mod memory_tree;

use std::path::Path;

use ndarray::ArrayD;

use crate::DataError;

pub use coil_file_source::CoilFileSource;
pub use json_tree::JsonTreeOpener;
pub use memory_tree::MemoryTree;

/// Kind of a node in the file hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Dataset,
}

/// One child entry of a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub name: String,
    pub kind: NodeKind,
}

impl NodeEntry {
    pub fn group(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: NodeKind::Group }
    }

    pub fn dataset(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: NodeKind::Dataset }
    }
}

/// An open hierarchical file. Dropping the handle releases the file.
pub trait HierarchicalFile: Send {
    /// Children of a group, in the file's iteration order
    fn list_children(&self, path: &str) -> Result<Vec<NodeEntry>, DataError>;

    /// Read a numeric dataset
    fn read_array(&self, path: &str) -> Result<ArrayD<f64>, DataError>;

    /// Read a numeric attribute of a node; `Ok(None)` if it does not exist
    fn read_attribute(&self, path: &str, name: &str) -> Result<Option<ArrayD<f64>>, DataError>;

    /// Shape of a dataset without materializing it.
    ///
    /// Adapters that can read metadata only should override this.
    fn shape(&self, path: &str) -> Result<Vec<usize>, DataError> {
        Ok(self.read_array(path)?.shape().to_vec())
    }

    /// Whether a group holds a dataset with the given name
    fn has_dataset(&self, group: &str, name: &str) -> bool {
        self.list_children(group)
            .map(|children| {
                children
                    .iter()
                    .any(|c| c.kind == NodeKind::Dataset && c.name == name)
            })
            .unwrap_or(false)
    }
}

/// Opens files from disk
pub trait FileOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn HierarchicalFile>, DataError>;
}

/// Callback for [`walk`]
pub trait TreeVisitor {
    fn visit(&mut self, path: &str, kind: NodeKind);
}

impl<F> TreeVisitor for F
where
    F: FnMut(&str, NodeKind),
{
    fn visit(&mut self, path: &str, kind: NodeKind) {
        self(path, kind)
    }
}

/// Join a child name onto a group path
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Pre-order walk over every node below the root. The root is not visited.
pub fn walk(file: &dyn HierarchicalFile, visitor: &mut dyn TreeVisitor) -> Result<(), DataError> {
    walk_group(file, "", visitor)
}

fn walk_group(
    file: &dyn HierarchicalFile,
    path: &str,
    visitor: &mut dyn TreeVisitor,
) -> Result<(), DataError> {
    for child in file.list_children(path)? {
        let child_path = join_path(path, &child.name);
        visitor.visit(&child_path, child.kind);
        if child.kind == NodeKind::Group {
            walk_group(file, &child_path, visitor)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_is_pre_order() {
        let tree = MemoryTree::new()
            .with_dataset("a/x", vec![3], vec![1.0, 2.0, 3.0])
            .with_dataset("a/b/z", vec![1], vec![0.0])
            .with_dataset("c", vec![1], vec![0.0]);

        let mut seen = Vec::new();
        walk(&tree, &mut |path: &str, kind: NodeKind| {
            seen.push((path.to_string(), kind));
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), NodeKind::Group),
                ("a/b".to_string(), NodeKind::Group),
                ("a/b/z".to_string(), NodeKind::Dataset),
                ("a/x".to_string(), NodeKind::Dataset),
                ("c".to_string(), NodeKind::Dataset),
            ]
        );
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "coil50"), "coil50");
        assert_eq!(join_path("coil50", "bending"), "coil50/bending");
    }

    #[test]
    fn test_default_shape_probe() {
        let tree = MemoryTree::new().with_dataset("g/x", vec![2, 3], vec![0.0; 6]);
        assert_eq!(tree.shape("g/x").unwrap(), vec![2, 3]);
        assert!(tree.has_dataset("g", "x"));
        assert!(!tree.has_dataset("g", "z"));
    }
}
