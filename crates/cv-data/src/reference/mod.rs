//! Reference curve resolution and densification
//!
//! A reference axis is looked up by an ordered list of resolvers; the first
//! one that produces an array wins. The column-mean fallback is its own
//! resolver so callers can tell a fabricated reference from a stored one.

use ndarray::{Array1, Array2, ArrayD, Axis};
use tracing::{debug, warn};

use cv_core::{DataKind, ReferenceOrigin};

use crate::config::LoaderConfig;
use crate::config::ReferenceNames;
use crate::sources::{join_path, HierarchicalFile};

/// Measured axis of a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveAxis {
    X,
    Z,
}

impl CurveAxis {
    pub fn name(&self) -> &'static str {
        match self {
            CurveAxis::X => "x",
            CurveAxis::Z => "z",
        }
    }
}

/// What a resolver gets to look at
pub struct ReferenceContext<'a> {
    pub file: &'a dyn HierarchicalFile,
    pub coil: &'a str,
    pub kind: DataKind,
    /// Path of the data group holding the actual x/z datasets
    pub group: &'a str,
    pub axis: CurveAxis,
    /// Measured curves of the same axis
    pub actual: &'a Array2<f64>,
}

/// One strategy for finding a reference axis
pub trait ReferenceResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, ctx: &ReferenceContext<'_>) -> Option<(Array1<f64>, ReferenceOrigin)>;
}

fn flatten(array: ArrayD<f64>) -> Array1<f64> {
    array.iter().copied().collect()
}

/// Attributes on the data group
pub struct AttributeResolver {
    names: ReferenceNames,
}

impl AttributeResolver {
    pub fn new(names: ReferenceNames) -> Self {
        Self { names }
    }
}

impl ReferenceResolver for AttributeResolver {
    fn name(&self) -> &'static str {
        "attribute"
    }

    fn resolve(&self, ctx: &ReferenceContext<'_>) -> Option<(Array1<f64>, ReferenceOrigin)> {
        for name in self.names.attribute_names(ctx.kind, ctx.axis) {
            match ctx.file.read_attribute(ctx.group, &name) {
                Ok(Some(values)) if !values.is_empty() => {
                    return Some((flatten(values), ReferenceOrigin::Attribute(name)));
                }
                Ok(_) => {}
                Err(e) => debug!("Attribute {} on {} unreadable: {}", name, ctx.group, e),
            }
        }
        None
    }
}

/// Datasets stored next to the actual x/z datasets
pub struct SiblingDatasetResolver {
    names: ReferenceNames,
}

impl SiblingDatasetResolver {
    pub fn new(names: ReferenceNames) -> Self {
        Self { names }
    }
}

impl ReferenceResolver for SiblingDatasetResolver {
    fn name(&self) -> &'static str {
        "sibling_dataset"
    }

    fn resolve(&self, ctx: &ReferenceContext<'_>) -> Option<(Array1<f64>, ReferenceOrigin)> {
        for name in self.names.dataset_names(ctx.kind, ctx.axis) {
            if !ctx.file.has_dataset(ctx.group, &name) {
                continue;
            }
            match ctx.file.read_array(&join_path(ctx.group, &name)) {
                Ok(values) if !values.is_empty() => {
                    return Some((flatten(values), ReferenceOrigin::SiblingDataset(name)));
                }
                Ok(_) => {}
                Err(e) => debug!("Dataset {} in {} unreadable: {}", name, ctx.group, e),
            }
        }
        None
    }
}

/// Column-wise mean of the measured curves.
///
/// This is measured data standing in for a nominal curve. Every use is
/// logged and tagged [`ReferenceOrigin::SyntheticMean`].
pub struct SyntheticMeanResolver;

impl ReferenceResolver for SyntheticMeanResolver {
    fn name(&self) -> &'static str {
        "synthetic_mean"
    }

    fn resolve(&self, ctx: &ReferenceContext<'_>) -> Option<(Array1<f64>, ReferenceOrigin)> {
        let mean = ctx.actual.mean_axis(Axis(0))?;
        warn!(
            "No reference {} for {} of {}; using mean of {} measured curves",
            ctx.axis.name(),
            ctx.kind,
            ctx.coil,
            ctx.actual.nrows()
        );
        Some((mean, ReferenceOrigin::SyntheticMean))
    }
}

/// Ordered resolver list
pub struct ReferenceChain {
    resolvers: Vec<Box<dyn ReferenceResolver>>,
}

impl ReferenceChain {
    pub fn new(resolvers: Vec<Box<dyn ReferenceResolver>>) -> Self {
        Self { resolvers }
    }

    /// Attribute, then sibling dataset, then (if allowed) synthetic mean
    pub fn from_config(config: &LoaderConfig) -> Self {
        let mut resolvers: Vec<Box<dyn ReferenceResolver>> = vec![
            Box::new(AttributeResolver::new(config.reference.clone())),
            Box::new(SiblingDatasetResolver::new(config.reference.clone())),
        ];
        if config.allow_synthetic_reference {
            resolvers.push(Box::new(SyntheticMeanResolver));
        }
        Self::new(resolvers)
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub fn resolve(&self, ctx: &ReferenceContext<'_>) -> Option<(Array1<f64>, ReferenceOrigin)> {
        self.resolvers.iter().find_map(|resolver| {
            let found = resolver.resolve(ctx)?;
            debug!(
                "Reference {} for {}/{} from {}",
                ctx.axis.name(),
                ctx.coil,
                ctx.kind,
                resolver.name()
            );
            Some(found)
        })
    }
}

/// Densified reference curve
#[derive(Debug, Clone, PartialEq)]
pub struct DenseReference {
    pub x: Array1<f64>,
    pub z: Array1<f64>,
    pub is_midpoint: Vec<bool>,
}

/// Insert the midpoint between every pair of consecutive reference points.
///
/// `n` points become `2n-1`; originals sit at even positions. `x` and `z`
/// must have the same length.
pub fn densify(x: &Array1<f64>, z: &Array1<f64>) -> DenseReference {
    let n = x.len().min(z.len());
    let len = if n == 0 { 0 } else { 2 * n - 1 };

    let mut dense_x = Vec::with_capacity(len);
    let mut dense_z = Vec::with_capacity(len);
    let mut is_midpoint = Vec::with_capacity(len);

    for k in 0..n {
        dense_x.push(x[k]);
        dense_z.push(z[k]);
        is_midpoint.push(false);

        if k + 1 < n {
            dense_x.push((x[k] + x[k + 1]) / 2.0);
            dense_z.push((z[k] + z[k + 1]) / 2.0);
            is_midpoint.push(true);
        }
    }

    DenseReference {
        x: Array1::from(dense_x),
        z: Array1::from(dense_z),
        is_midpoint,
    }
}
