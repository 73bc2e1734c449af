//! Dataset model produced by a coil load

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// The three measurement series stored per coil
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Screwdown,
    Bending,
    Profile,
}

impl DataKind {
    /// Load order used by the loader
    pub const ALL: [DataKind; 3] = [DataKind::Screwdown, DataKind::Bending, DataKind::Profile];

    /// Lowercase keyword matched against group paths
    pub fn keyword(&self) -> &'static str {
        match self {
            DataKind::Screwdown => "screwdown",
            DataKind::Bending => "bending",
            DataKind::Profile => "profile",
        }
    }

    /// Capitalized form, as used in some reference attribute names
    pub fn label(&self) -> &'static str {
        match self {
            DataKind::Screwdown => "Screwdown",
            DataKind::Bending => "Bending",
            DataKind::Profile => "Profile",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Where a reference axis came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceOrigin {
    /// Attribute on the data group
    Attribute(String),
    /// Dataset next to the actual x/z datasets
    SiblingDataset(String),
    /// Column-wise mean of the measured curves. Not a nominal curve.
    SyntheticMean,
}

impl ReferenceOrigin {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, ReferenceOrigin::SyntheticMean)
    }
}

/// Measured and reference curves for one data kind of one coil
#[derive(Debug, Clone)]
pub struct DataSeries {
    /// Measured x values; rows are curves, columns are sample points
    pub actual_x: Array2<f64>,
    /// Measured z values, same layout as `actual_x`
    pub actual_z: Array2<f64>,
    /// Densified reference x (length `2n-1` for a reference of length n)
    pub ref_x: Array1<f64>,
    /// Densified reference z
    pub ref_z: Array1<f64>,
    /// True where the reference point is an interpolated midpoint
    pub is_midpoint: Vec<bool>,
    /// Provenance of the reference (x axis, z axis)
    pub reference_origin: (ReferenceOrigin, ReferenceOrigin),
}

impl DataSeries {
    /// Number of measured curves
    pub fn row_count(&self) -> usize {
        self.actual_x.nrows()
    }

    /// Number of samples per measured curve
    pub fn point_count(&self) -> usize {
        self.actual_x.ncols()
    }

    /// Whether either reference axis was fabricated from measured data
    pub fn has_synthetic_reference(&self) -> bool {
        self.reference_origin.0.is_synthetic() || self.reference_origin.1.is_synthetic()
    }

    /// Reference points that were actually sampled, without midpoints
    pub fn original_reference(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ref_x
            .iter()
            .zip(self.ref_z.iter())
            .zip(self.is_midpoint.iter())
            .filter(|(_, mid)| !**mid)
            .map(|((x, z), _)| (*x, *z))
    }
}

/// Global row numbers of a coil, one per in-coil row index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlankInfo(Vec<u64>);

impl BlankInfo {
    pub fn new(values: Vec<u64>) -> Self {
        Self(values)
    }

    /// Contiguous numbering of `rows` values starting at `start`
    pub fn contiguous(start: u64, rows: usize) -> Self {
        Self((start..start + rows as u64).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<u64> {
        self.0.get(row).copied()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// First row index carrying the given number
    pub fn resolve(&self, number: u64) -> Option<usize> {
        self.0.iter().position(|&n| n == number)
    }
}

/// Everything loaded for one coil
#[derive(Debug, Clone)]
pub struct Dataset {
    pub coil: String,
    pub series: BTreeMap<DataKind, DataSeries>,
    pub blank_info: BlankInfo,
}

impl Dataset {
    /// Effective row count; equals `blank_info.len()`
    pub fn row_count(&self) -> usize {
        self.blank_info.len()
    }

    pub fn series(&self, kind: DataKind) -> Option<&DataSeries> {
        self.series.get(&kind)
    }

    /// Data kinds that loaded successfully, in load order
    pub fn kinds(&self) -> Vec<DataKind> {
        self.series.keys().copied().collect()
    }

    /// Reverse lookup from a blank info number to a row index
    pub fn resolve_blank_info(&self, number: u64) -> Option<usize> {
        self.blank_info
            .resolve(number)
            .filter(|&row| row < self.row_count())
    }

    /// Blank info shown for a row, falling back to the 1-based row number
    pub fn display_number(&self, row: usize) -> u64 {
        self.blank_info.get(row).unwrap_or(row as u64 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_with(blank_info: BlankInfo) -> Dataset {
        Dataset {
            coil: "coil51".to_string(),
            series: BTreeMap::new(),
            blank_info,
        }
    }

    #[test]
    fn test_blank_info_round_trip() {
        let dataset = dataset_with(BlankInfo::contiguous(13, 8));
        for row in 0..dataset.row_count() {
            let number = dataset.blank_info.get(row).unwrap();
            assert_eq!(dataset.resolve_blank_info(number), Some(row));
        }
        assert_eq!(dataset.resolve_blank_info(15), Some(2));
        assert_eq!(dataset.resolve_blank_info(12), None);
        assert_eq!(dataset.resolve_blank_info(21), None);
    }

    #[test]
    fn test_resolve_takes_first_match() {
        let dataset = dataset_with(BlankInfo::new(vec![4, 7, 7, 9]));
        assert_eq!(dataset.resolve_blank_info(7), Some(1));
    }

    #[test]
    fn test_display_number_fallback() {
        let dataset = dataset_with(BlankInfo::contiguous(1, 3));
        assert_eq!(dataset.display_number(2), 3);
        assert_eq!(dataset.display_number(10), 11);
    }

    #[test]
    fn test_original_reference_skips_midpoints() {
        let series = DataSeries {
            actual_x: Array2::zeros((1, 3)),
            actual_z: Array2::zeros((1, 3)),
            ref_x: Array1::from(vec![0.0, 5.0, 10.0]),
            ref_z: Array1::from(vec![0.0, 2.5, 5.0]),
            is_midpoint: vec![false, true, false],
            reference_origin: (ReferenceOrigin::SyntheticMean, ReferenceOrigin::Attribute("ref_z".into())),
        };
        let points: Vec<_> = series.original_reference().collect();
        assert_eq!(points, vec![(0.0, 0.0), (10.0, 5.0)]);
        assert!(series.has_synthetic_reference());
    }
}
