use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use cv_core::{CoilSource, Dataset};

use super::FileOpener;
use crate::loader::DatasetLoader;
use crate::DataError;

/// Coils of one measurement file.
///
/// Every call opens the file, reads what it needs and drops the handle
/// before returning.
#[derive(Clone)]
pub struct CoilFileSource {
    path: PathBuf,
    name: String,
    opener: Arc<dyn FileOpener>,
    loader: Arc<DatasetLoader>,
}

impl CoilFileSource {
    pub fn new(path: PathBuf, opener: Arc<dyn FileOpener>, loader: Arc<DatasetLoader>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            opener,
            loader,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn loader(&self) -> &Arc<DatasetLoader> {
        &self.loader
    }

    /// List coils and allocate blank info ranges for the new ones
    pub fn discover_coils(&self) -> Result<Vec<String>, DataError> {
        let file = self.opener.open(&self.path)?;
        let coils = self.loader.scanner().discover_coils(file.as_ref())?;
        if coils.is_empty() {
            return Err(DataError::NoCoilsFound { path: self.path.clone() });
        }
        self.loader.compute_ranges(file.as_ref(), &coils);
        info!("{} has coils {:?}", self.name, coils);
        Ok(coils)
    }

    /// Load one coil. Ranges for the whole file are computed first if the
    /// coil has none yet, so numbering follows coil order, not load order.
    pub fn load(&self, coil: &str) -> Result<Dataset, DataError> {
        let file = self.opener.open(&self.path)?;
        if self.loader.allocator().range_for(coil).is_none() {
            let coils = self.loader.scanner().discover_coils(file.as_ref())?;
            self.loader.compute_ranges(file.as_ref(), &coils);
        }
        self.loader.load_coil(file.as_ref(), coil)
    }
}

#[async_trait]
impl CoilSource for CoilFileSource {
    async fn coils(&self) -> anyhow::Result<Vec<String>> {
        let coils = tokio::task::spawn_blocking({
            let source = self.clone();
            move || source.discover_coils()
        })
        .await??;
        Ok(coils)
    }

    async fn load_coil(&self, coil: &str) -> anyhow::Result<Dataset> {
        let dataset = tokio::task::spawn_blocking({
            let source = self.clone();
            let coil = coil.to_string();
            move || source.load(&coil)
        })
        .await??;
        Ok(dataset)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
