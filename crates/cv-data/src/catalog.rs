//! Entry point tying discovery, scanning and loading together

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use cv_core::{Dataset, SessionSettings};

use crate::config::CoilViewConfig;
use crate::index::RangeAllocator;
use crate::loader::DatasetLoader;
use crate::locator::FileLocator;
use crate::schema::SchemaScanner;
use crate::sources::{CoilFileSource, FileOpener, JsonTreeOpener};
use crate::DataError;

/// Files, coils and datasets addressed by display name.
///
/// One catalog owns one range allocator, so blank info numbers are unique
/// across every file it opens.
pub struct Catalog {
    config: CoilViewConfig,
    locator: FileLocator,
    opener: Arc<dyn FileOpener>,
    loader: Arc<DatasetLoader>,
}

impl Catalog {
    pub fn new(config: CoilViewConfig, opener: Arc<dyn FileOpener>) -> Self {
        let loader = DatasetLoader::new(
            Arc::new(RangeAllocator::new()),
            SchemaScanner::with_config(config.scanner.clone()),
            config.loader.clone(),
        );
        Self {
            locator: FileLocator::new(config.locator.clone(), opener.clone()),
            opener,
            loader: Arc::new(loader),
            config,
        }
    }

    /// Catalog over JSON snapshots of hierarchical files
    pub fn with_json_snapshots(config: CoilViewConfig) -> Self {
        Self::new(config, Arc::new(JsonTreeOpener))
    }

    pub fn config(&self) -> &CoilViewConfig {
        &self.config
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    pub fn loader(&self) -> &Arc<DatasetLoader> {
        &self.loader
    }

    pub fn allocator(&self) -> &Arc<RangeAllocator> {
        self.loader.allocator()
    }

    /// Settings for a session showing datasets from this catalog
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            rows_per_page: self.config.navigation.rows_per_page.max(1),
            auto_advance_interval: Duration::from_millis(self.config.navigation.auto_advance_interval_ms),
        }
    }

    /// Display names of the files worth offering
    pub fn locate_files(&self) -> Vec<String> {
        self.locator.locate_files()
    }

    /// Async source over one file, for a session
    pub fn source(&self, file_name: &str) -> Result<CoilFileSource, DataError> {
        let path = self.locator.resolve(file_name)?;
        Ok(CoilFileSource::new(path, self.opener.clone(), self.loader.clone()))
    }

    /// Coil identifiers of a file. Ranges for new coils are allocated here,
    /// so an empty list is not an error.
    pub fn list_coils(&self, file_name: &str) -> Result<Vec<String>, DataError> {
        let path = self.locator.resolve(file_name)?;
        let file = self.opener.open(&path)?;
        let coils = self.loader.scanner().discover_coils(file.as_ref())?;
        self.loader.compute_ranges(file.as_ref(), &coils);
        Ok(coils)
    }

    /// Discover the coils of a file and allocate their ranges
    pub fn open_file(&self, file_name: &str) -> Result<Vec<String>, DataError> {
        self.source(file_name)?.discover_coils()
    }

    pub fn load_coil(&self, file_name: &str, coil: &str) -> Result<Dataset, DataError> {
        self.source(file_name)?.load(coil)
    }

    /// First offered file that has at least one coil, with its coils
    pub fn open_first_usable(&self) -> Result<(String, Vec<String>), DataError> {
        for file_name in self.locate_files() {
            match self.open_file(&file_name) {
                Ok(coils) => {
                    info!("Using {} with {} coils", file_name, coils.len());
                    return Ok((file_name, coils));
                }
                Err(e) => warn!("Skipping {}: {}", file_name, e),
            }
        }
        Err(DataError::NoUsableData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MemoryTree;
    use cv_core::BlankInfo;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_snapshot(dir: &Path, name: &str, tree: &MemoryTree) {
        let mut json = serde_json::to_string(tree).unwrap();
        json.push_str(&" ".repeat(1100));
        fs::write(dir.join(name), json).unwrap();
    }

    fn coil_tree(coils: &[(&str, usize)]) -> MemoryTree {
        let mut tree = MemoryTree::new();
        for (coil, rows) in coils {
            let group = format!("{}/profile", coil);
            tree = tree
                .with_dataset(&format!("{}/x", group), vec![*rows, 3], vec![0.5; rows * 3])
                .with_dataset(&format!("{}/z", group), vec![*rows, 3], vec![1.5; rows * 3])
                .with_dataset(&format!("{}/ref_x", group), vec![3], vec![0.0, 1.0, 2.0])
                .with_dataset(&format!("{}/ref_z", group), vec![3], vec![0.0, 0.0, 0.0]);
        }
        tree
    }

    fn catalog(dir: &TempDir) -> Catalog {
        let mut config = CoilViewConfig::default();
        config.locator.search_dirs = vec![dir.path().to_path_buf()];
        Catalog::with_json_snapshots(config)
    }

    #[test]
    fn test_external_operations() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "line1.h5", &coil_tree(&[("coil51", 8), ("coil50", 12)]));
        let catalog = catalog(&dir);

        assert_eq!(catalog.locate_files(), vec!["line1.h5"]);
        assert_eq!(catalog.list_coils("line1.h5").unwrap(), vec!["coil50", "coil51"]);
        assert_eq!(catalog.allocator().ranges().len(), 2);

        catalog.open_file("line1.h5").unwrap();
        let dataset = catalog.load_coil("line1.h5", "coil51").unwrap();
        assert_eq!(dataset.blank_info.get(0), Some(13));
        assert_eq!(dataset.resolve_blank_info(15), Some(2));

        assert!(matches!(catalog.load_coil("missing.h5", "coil50"), Err(DataError::NotFound(_))));
    }

    #[test]
    fn test_list_then_load_uses_numeric_order() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "line1.h5", &coil_tree(&[("coil51", 8), ("coil50", 12)]));
        let catalog = catalog(&dir);
        catalog.locate_files();

        catalog.list_coils("line1.h5").unwrap();
        let dataset = catalog.load_coil("line1.h5", "coil51").unwrap();
        assert_eq!(dataset.blank_info, BlankInfo::contiguous(13, 8));
        assert_eq!(dataset.resolve_blank_info(15), Some(2));
    }

    #[test]
    fn test_load_without_listing_uses_numeric_order() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "line1.h5", &coil_tree(&[("coil51", 8), ("coil50", 12)]));
        let catalog = catalog(&dir);
        catalog.locate_files();

        let dataset = catalog.load_coil("line1.h5", "coil51").unwrap();
        assert_eq!(dataset.blank_info, BlankInfo::contiguous(13, 8));
        assert_eq!(catalog.allocator().locate(1), Some(("coil50".to_string(), 0)));
    }

    #[test]
    fn test_ranges_stay_unique_across_files() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "a.h5", &coil_tree(&[("coil50", 4)]));
        write_snapshot(dir.path(), "b.h5", &coil_tree(&[("coil57", 6)]));
        let catalog = catalog(&dir);
        catalog.locate_files();

        let b = catalog.load_coil("b.h5", "coil57").unwrap();
        let a = catalog.load_coil("a.h5", "coil50").unwrap();
        assert_eq!(b.blank_info.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(a.blank_info.as_slice(), &[7, 8, 9, 10]);
    }

    #[test]
    fn test_open_first_usable_skips_files_without_coils() {
        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "a_empty.h5", &MemoryTree::new().with_dataset("misc/y", vec![1], vec![0.0]));
        write_snapshot(dir.path(), "b_real.h5", &coil_tree(&[("coil52", 2)]));
        let catalog = catalog(&dir);

        let (file, coils) = catalog.open_first_usable().unwrap();
        assert_eq!(file, "b_real.h5");
        assert_eq!(coils, vec!["coil52"]);
    }

    #[tokio::test]
    async fn test_session_over_catalog_source() {
        use cv_core::{NavigationEvent, Session};

        let dir = TempDir::new().unwrap();
        write_snapshot(dir.path(), "line1.h5", &coil_tree(&[("coil50", 12), ("coil51", 8)]));
        let catalog = catalog(&dir);
        let session = Session::new(catalog.session_settings());

        let source = Arc::new(catalog.source("line1.h5").unwrap());
        let coils = session.open_source(source).await.unwrap();
        assert_eq!(coils, vec!["coil50", "coil51"]);

        session.select_coil("coil51").await.unwrap();
        let state = session.navigate(NavigationEvent::JumpToBlankInfo(15)).unwrap();
        assert_eq!(state.current_row(), Some(2));
        assert_eq!(session.navigation.current_blank_info(), Some(15));
    }

    #[test]
    fn test_no_usable_data() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog(&dir);
        assert!(matches!(catalog.open_first_usable(), Err(DataError::NoUsableData)));
    }
}
