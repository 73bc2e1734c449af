//! Coil loading: actual curves, references and blank info

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::{Array2, ArrayD, Ix2};
use tracing::{info, warn};

use cv_core::{BlankInfo, DataKind, DataSeries, Dataset};

use crate::cache::BlankInfoCache;
use crate::config::LoaderConfig;
use crate::index::{CoilRange, RangeAllocator};
use crate::reference::{densify, CurveAxis, ReferenceChain, ReferenceContext};
use crate::schema::{numeric_key, SchemaScanner};
use crate::sources::{join_path, HierarchicalFile};
use crate::DataError;

/// Builds [`Dataset`]s from an open file.
///
/// The range allocator is shared with everything else in the session so
/// blank info numbers stay stable across files and reloads.
pub struct DatasetLoader {
    allocator: Arc<RangeAllocator>,
    cache: BlankInfoCache,
    scanner: SchemaScanner,
    references: ReferenceChain,
    config: LoaderConfig,
}

impl DatasetLoader {
    pub fn new(allocator: Arc<RangeAllocator>, scanner: SchemaScanner, config: LoaderConfig) -> Self {
        Self {
            allocator,
            cache: BlankInfoCache::new(),
            references: ReferenceChain::from_config(&config),
            scanner,
            config,
        }
    }

    /// Share a blank info cache with other loaders
    pub fn with_cache(mut self, cache: BlankInfoCache) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the reference resolver chain
    pub fn with_references(mut self, references: ReferenceChain) -> Self {
        self.references = references;
        self
    }

    pub fn allocator(&self) -> &Arc<RangeAllocator> {
        &self.allocator
    }

    pub fn cache(&self) -> &BlankInfoCache {
        &self.cache
    }

    pub fn scanner(&self) -> &SchemaScanner {
        &self.scanner
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load every data kind of a coil.
    ///
    /// Kinds that fail are left out; the load fails only if none succeed.
    pub fn load_coil(&self, file: &dyn HierarchicalFile, coil: &str) -> Result<Dataset, DataError> {
        info!("Loading data for coil {}", coil);
        let paths = self.scanner.discover_data_paths(file, coil)?;
        if paths.is_empty() {
            warn!("No data paths found for {}", coil);
            return Err(DataError::NoDataForCoil { coil: coil.to_string() });
        }

        let mut series = BTreeMap::new();
        for (kind, group) in &paths {
            match self.load_series(file, coil, *kind, group) {
                Ok(loaded) => {
                    series.insert(*kind, loaded);
                }
                Err(e) => warn!("Skipping {} data for {}: {}", kind, coil, e),
            }
        }

        let rows = series.values().map(DataSeries::row_count).max().unwrap_or(0);
        if rows == 0 {
            return Err(DataError::NoDataForCoil { coil: coil.to_string() });
        }

        let blank_info = self.blank_info_for(coil, rows)?;
        info!(
            "Loaded {} with {} rows, kinds {:?}, blank info {:?}..={:?}",
            coil,
            rows,
            series.keys().collect::<Vec<_>>(),
            blank_info.get(0),
            blank_info.get(rows - 1)
        );

        Ok(Dataset {
            coil: coil.to_string(),
            series,
            blank_info,
        })
    }

    /// Load one data kind from its group
    pub fn load_series(
        &self,
        file: &dyn HierarchicalFile,
        coil: &str,
        kind: DataKind,
        group: &str,
    ) -> Result<DataSeries, DataError> {
        let scanner = self.scanner.config();
        let actual_x = read_curves(file, &join_path(group, &scanner.x_name))?;
        let actual_z = read_curves(file, &join_path(group, &scanner.z_name))?;
        if actual_x.dim() != actual_z.dim() {
            return Err(DataError::Format(format!(
                "{}: x is {:?} but z is {:?}",
                group,
                actual_x.dim(),
                actual_z.dim()
            )));
        }

        let ref_x = self.references.resolve(&ReferenceContext {
            file,
            coil,
            kind,
            group,
            axis: CurveAxis::X,
            actual: &actual_x,
        });
        let ref_z = self.references.resolve(&ReferenceContext {
            file,
            coil,
            kind,
            group,
            axis: CurveAxis::Z,
            actual: &actual_z,
        });

        let ((ref_x, origin_x), (ref_z, origin_z)) = match (ref_x, ref_z) {
            (Some(x), Some(z)) if x.0.len() == z.0.len() && !x.0.is_empty() => (x, z),
            (x, z) => {
                return Err(DataError::MissingOrMismatchedReference {
                    kind,
                    x_len: x.map(|(values, _)| values.len()),
                    z_len: z.map(|(values, _)| values.len()),
                })
            }
        };

        let dense = densify(&ref_x, &ref_z);
        Ok(DataSeries {
            actual_x,
            actual_z,
            ref_x: dense.x,
            ref_z: dense.z,
            is_midpoint: dense.is_midpoint,
            reference_origin: (origin_x, origin_z),
        })
    }

    /// Row count of a coil from dataset shapes only
    pub fn probe_row_count(&self, file: &dyn HierarchicalFile, coil: &str) -> Result<usize, DataError> {
        let paths = self.scanner.discover_data_paths(file, coil)?;
        if paths.is_empty() {
            return Err(DataError::NoDataForCoil { coil: coil.to_string() });
        }

        let x_name = &self.scanner.config().x_name;
        let mut rows = 0;
        for group in paths.values() {
            match file.shape(&join_path(group, x_name)) {
                Ok(shape) => rows = rows.max(rows_in_shape(&shape)),
                Err(e) => warn!("Could not probe {}: {}", group, e),
            }
        }
        Ok(rows)
    }

    /// Allocate blank info ranges for the coils of a file, by numeric key
    pub fn compute_ranges(&self, file: &dyn HierarchicalFile, coils: &[String]) -> Vec<CoilRange> {
        let mut ordered = coils.to_vec();
        ordered.sort_by_key(|coil| numeric_key(coil));
        let created = self
            .allocator
            .compute_ranges(&ordered, |coil| self.probe_row_count(file, coil));
        info!("Coil ranges: {:?}", self.allocator.ranges());
        created
    }

    /// Blank info for `rows` rows of a coil.
    ///
    /// Reuses the cached array when its length still matches, otherwise
    /// regenerates from the coil's range start. A coil that gained rows
    /// keeps its start; its range grows only if it was allocated last.
    pub fn blank_info_for(&self, coil: &str, rows: usize) -> Result<BlankInfo, DataError> {
        if let Some(cached) = self.cache.get_matching(coil, rows) {
            return Ok(cached);
        }

        let mut range = self.allocator.allocate_for_unseen(coil, rows)?;
        if rows > range.count {
            if let Some(grown) = self.allocator.grow_last(coil, rows) {
                range = grown;
            }
        }
        if rows > range.count {
            warn!(
                "Coil {} now has {} rows but its range {}..={} holds {}; numbers past the range may collide",
                coil, rows, range.start, range.end, range.count
            );
        }

        let blank_info = BlankInfo::contiguous(range.start, rows);
        self.cache.put(coil, blank_info.clone());
        Ok(blank_info)
    }
}

/// Read measured curves as rows; a 1D dataset is one curve
fn read_curves(file: &dyn HierarchicalFile, path: &str) -> Result<Array2<f64>, DataError> {
    let array: ArrayD<f64> = file.read_array(path)?;
    match array.ndim() {
        1 => {
            let points = array.len();
            Ok(array.into_shape((1, points))?)
        }
        2 => Ok(array.into_dimensionality::<Ix2>()?),
        n => Err(DataError::Format(format!("{} has {} dimensions, expected 1 or 2", path, n))),
    }
}

fn rows_in_shape(shape: &[usize]) -> usize {
    match shape {
        [] => 0,
        [points] => usize::from(*points > 0),
        [rows, ..] => *rows,
    }
}
