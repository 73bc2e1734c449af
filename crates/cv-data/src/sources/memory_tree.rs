//! In-memory hierarchical file

use std::collections::BTreeMap;

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use super::{HierarchicalFile, NodeEntry};
use crate::DataError;

/// A node of an in-memory tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Group {
        #[serde(default)]
        attributes: BTreeMap<String, Vec<f64>>,
        #[serde(default)]
        children: BTreeMap<String, TreeNode>,
    },
    Dataset {
        /// Row-major shape; a missing shape means a 1D array
        #[serde(default)]
        shape: Option<Vec<usize>>,
        data: Vec<f64>,
    },
}

impl TreeNode {
    fn empty_group() -> Self {
        TreeNode::Group {
            attributes: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    fn dataset_shape(shape: &Option<Vec<usize>>, data: &[f64]) -> Vec<usize> {
        shape.clone().unwrap_or_else(|| vec![data.len()])
    }
}

/// Hierarchical file held entirely in memory.
///
/// Children iterate in name order, like the default link order of most
/// hierarchical formats. Serializes as its root group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryTree {
    root: TreeNode,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        Self { root: TreeNode::empty_group() }
    }

    /// Wrap a root node. Fails if the root is not a group.
    pub fn from_root(root: TreeNode) -> Result<Self, DataError> {
        match root {
            TreeNode::Group { .. } => Ok(Self { root }),
            TreeNode::Dataset { .. } => Err(DataError::Format("root node must be a group".to_string())),
        }
    }

    /// Add a dataset, creating intermediate groups
    pub fn with_dataset(mut self, path: &str, shape: Vec<usize>, data: Vec<f64>) -> Self {
        self.insert_dataset(path, shape, data);
        self
    }

    /// Add a 1D attribute on a group, creating the group if needed
    pub fn with_attribute(mut self, group: &str, name: &str, values: Vec<f64>) -> Self {
        self.insert_attribute(group, name, values);
        self
    }

    /// Insert a dataset. Any node already on the path is replaced.
    pub fn insert_dataset(&mut self, path: &str, shape: Vec<usize>, data: Vec<f64>) {
        let mut segments: Vec<&str> = segments(path).collect();
        let Some(name) = segments.pop() else {
            return;
        };
        if let TreeNode::Group { children, .. } = ensure_group(&mut self.root, &segments) {
            children.insert(
                name.to_string(),
                TreeNode::Dataset { shape: Some(shape), data },
            );
        }
    }

    pub fn insert_attribute(&mut self, group: &str, name: &str, values: Vec<f64>) {
        let segments: Vec<&str> = segments(group).collect();
        if let TreeNode::Group { attributes, .. } = ensure_group(&mut self.root, &segments) {
            attributes.insert(name.to_string(), values);
        }
    }

    fn node(&self, path: &str) -> Result<&TreeNode, DataError> {
        let mut node = &self.root;
        for segment in segments(path) {
            node = match node {
                TreeNode::Group { children, .. } => children
                    .get(segment)
                    .ok_or_else(|| DataError::NotFound(path.to_string()))?,
                TreeNode::Dataset { .. } => return Err(DataError::NotFound(path.to_string())),
            };
        }
        Ok(node)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Walk to a group, turning anything in the way into an empty group
fn ensure_group<'a>(node: &'a mut TreeNode, segments: &[&str]) -> &'a mut TreeNode {
    if !matches!(node, TreeNode::Group { .. }) {
        *node = TreeNode::empty_group();
    }
    match (node, segments.split_first()) {
        (TreeNode::Group { children, .. }, Some((first, rest))) => {
            let child = children
                .entry(first.to_string())
                .or_insert_with(TreeNode::empty_group);
            ensure_group(child, rest)
        }
        (node, _) => node,
    }
}

impl HierarchicalFile for MemoryTree {
    fn list_children(&self, path: &str) -> Result<Vec<NodeEntry>, DataError> {
        match self.node(path)? {
            TreeNode::Group { children, .. } => Ok(children
                .iter()
                .map(|(name, child)| match child {
                    TreeNode::Group { .. } => NodeEntry::group(name.clone()),
                    TreeNode::Dataset { .. } => NodeEntry::dataset(name.clone()),
                })
                .collect()),
            TreeNode::Dataset { .. } => Err(DataError::Format(format!("{} is not a group", path))),
        }
    }

    fn read_array(&self, path: &str) -> Result<ArrayD<f64>, DataError> {
        match self.node(path)? {
            TreeNode::Dataset { shape, data } => {
                let shape = TreeNode::dataset_shape(shape, data);
                Ok(ArrayD::from_shape_vec(IxDyn(&shape), data.clone())?)
            }
            TreeNode::Group { .. } => Err(DataError::Format(format!("{} is not a dataset", path))),
        }
    }

    fn read_attribute(&self, path: &str, name: &str) -> Result<Option<ArrayD<f64>>, DataError> {
        match self.node(path)? {
            TreeNode::Group { attributes, .. } => Ok(attributes
                .get(name)
                .map(|values| ndarray::Array1::from(values.clone()).into_dyn())),
            TreeNode::Dataset { .. } => Ok(None),
        }
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>, DataError> {
        match self.node(path)? {
            TreeNode::Dataset { shape, data } => Ok(TreeNode::dataset_shape(shape, data)),
            TreeNode::Group { .. } => Err(DataError::Format(format!("{} is not a dataset", path))),
        }
    }
}
