//! Coil and data path discovery inside one file

use indexmap::IndexMap;
use tracing::{debug, info};

use cv_core::DataKind;

use crate::config::ScannerConfig;
use crate::sources::{join_path, walk, HierarchicalFile, NodeKind};
use crate::DataError;

/// Detects coils and their per-kind data groups by walking the hierarchy
#[derive(Debug, Clone, Default)]
pub struct SchemaScanner {
    config: ScannerConfig,
}

/// Numeric sort key of a coil identifier: all of its digits read as one
/// number, 0 if there are none
pub fn numeric_key(id: &str) -> u64 {
    let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

impl SchemaScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Set the marker token coil segments must contain
    pub fn with_marker_token(mut self, token: impl Into<String>) -> Self {
        self.config.marker_token = token.into();
        self
    }

    /// Set the accepted range for purely numeric coil segments
    pub fn with_numeric_range(mut self, min: u64, max: u64) -> Self {
        self.config.numeric_min = min;
        self.config.numeric_max = max;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Coil identifiers in the file, ascending by numeric key
    pub fn discover_coils(&self, file: &dyn HierarchicalFile) -> Result<Vec<String>, DataError> {
        let groups = Self::group_paths(file)?;

        let mut coils = self.collect_coils(file, &groups, |s| self.is_marker_segment(s));
        if coils.is_empty() {
            info!("No coils found with the marker pattern, trying numeric segments");
            coils = self.collect_coils(file, &groups, |s| self.is_numeric_segment(s));
        }

        coils.sort_by(|a, b| numeric_key(a).cmp(&numeric_key(b)).then_with(|| a.cmp(b)));
        info!("Discovered coils: {:?}", coils);
        Ok(coils)
    }

    /// First group per data kind whose path has the coil as a segment, the
    /// kind keyword anywhere, and x/z datasets
    pub fn discover_data_paths(
        &self,
        file: &dyn HierarchicalFile,
        coil: &str,
    ) -> Result<IndexMap<DataKind, String>, DataError> {
        let groups = Self::group_paths(file)?;
        let mut paths = IndexMap::new();

        for kind in DataKind::ALL {
            let found = groups.iter().find(|path| {
                path.split('/').any(|segment| segment == coil)
                    && path.to_lowercase().contains(kind.keyword())
                    && self.has_axes(file, path)
            });
            if let Some(path) = found {
                debug!("Found {} data for {} at {}", kind, coil, path);
                paths.insert(kind, path.clone());
            }
        }
        Ok(paths)
    }

    fn group_paths(file: &dyn HierarchicalFile) -> Result<Vec<String>, DataError> {
        let mut groups = Vec::new();
        walk(file, &mut |path: &str, kind: NodeKind| {
            if kind == NodeKind::Group {
                groups.push(path.to_string());
            }
        })?;
        Ok(groups)
    }

    fn collect_coils<F>(&self, file: &dyn HierarchicalFile, groups: &[String], qualifies: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut coils: Vec<String> = Vec::new();
        for group in groups {
            for segment in group.split('/') {
                if coils.iter().any(|c| c == segment) || !qualifies(segment) {
                    continue;
                }
                if self.has_axes(file, group) || self.child_has_axes(file, group) {
                    debug!("Found coil {} at {}", segment, group);
                    coils.push(segment.to_string());
                }
            }
        }
        coils
    }

    fn is_marker_segment(&self, segment: &str) -> bool {
        segment.to_lowercase().contains(&self.config.marker_token.to_lowercase())
            && segment.chars().any(|c| c.is_ascii_digit())
            && segment.len() < self.config.max_segment_len
    }

    fn is_numeric_segment(&self, segment: &str) -> bool {
        !segment.is_empty()
            && segment.chars().all(|c| c.is_ascii_digit())
            && segment
                .parse::<u64>()
                .map(|n| (self.config.numeric_min..=self.config.numeric_max).contains(&n))
                .unwrap_or(false)
    }

    fn has_axes(&self, file: &dyn HierarchicalFile, group: &str) -> bool {
        file.has_dataset(group, &self.config.x_name) && file.has_dataset(group, &self.config.z_name)
    }

    fn child_has_axes(&self, file: &dyn HierarchicalFile, group: &str) -> bool {
        file.list_children(group)
            .map(|children| {
                children
                    .iter()
                    .filter(|c| c.kind == NodeKind::Group)
                    .any(|c| self.has_axes(file, &join_path(group, &c.name)))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemoryTree;

    fn with_axes(tree: MemoryTree, group: &str) -> MemoryTree {
        tree.with_dataset(&format!("{}/x", group), vec![1, 2], vec![0.0, 1.0])
            .with_dataset(&format!("{}/z", group), vec![1, 2], vec![0.0, 1.0])
    }

    #[test]
    fn test_discover_coils_sorted_by_number() {
        let mut tree = MemoryTree::new();
        for group in ["coil51/bending", "coil50/profile", "coil9/screwdown", "coil50/bending"] {
            tree = with_axes(tree, group);
        }
        let coils = SchemaScanner::new().discover_coils(&tree).unwrap();
        assert_eq!(coils, vec!["coil9", "coil50", "coil51"]);
    }

    #[test]
    fn test_marker_requires_axes_and_digit() {
        let tree = with_axes(MemoryTree::new(), "coil50/bending")
            .with_dataset("coil52/bending/x", vec![2], vec![0.0, 1.0])
            .with_dataset("coil/bending/x", vec![1], vec![0.0])
            .with_dataset("a_very_long_coil_name_99/x", vec![1], vec![0.0])
            .with_dataset("a_very_long_coil_name_99/z", vec![1], vec![0.0]);
        let coils = SchemaScanner::new().discover_coils(&tree).unwrap();
        assert_eq!(coils, vec!["coil50"]);
    }

    #[test]
    fn test_numeric_fallback() {
        let tree = with_axes(MemoryTree::new(), "run/55")
            .with_dataset("run/70/x", vec![1], vec![0.0])
            .with_dataset("run/70/z", vec![1], vec![0.0]);
        let coils = SchemaScanner::new().discover_coils(&tree).unwrap();
        assert_eq!(coils, vec!["55"]);

        let wide = SchemaScanner::new().with_numeric_range(1, 100);
        assert_eq!(wide.discover_coils(&tree).unwrap(), vec!["55", "70"]);
    }

    #[test]
    fn test_discover_data_paths_matches_whole_segment() {
        let mut tree = MemoryTree::new();
        for group in ["coil5/bending", "coil50/Bending", "coil50/profile", "coil50/profile_old"] {
            tree = with_axes(tree, group);
        }
        let paths = SchemaScanner::new().discover_data_paths(&tree, "coil50").unwrap();

        assert_eq!(paths.get(&DataKind::Bending).map(String::as_str), Some("coil50/Bending"));
        assert_eq!(paths.get(&DataKind::Profile).map(String::as_str), Some("coil50/profile"));
        assert!(!paths.contains_key(&DataKind::Screwdown));
        assert_eq!(paths.keys().copied().collect::<Vec<_>>(), vec![DataKind::Bending, DataKind::Profile]);
    }

    #[test]
    fn test_numeric_key() {
        assert_eq!(numeric_key("coil 51"), 51);
        assert_eq!(numeric_key("C7-2"), 72);
        assert_eq!(numeric_key("coil"), 0);
    }
}
