//! Name variants under which reference curves are stored

use serde::{Serialize, Deserialize};
use cv_core::DataKind;

use crate::reference::CurveAxis;

/// Name templates for reference curves.
///
/// Placeholders: `{Kind}` (capitalized data kind), `{kind}` (lowercase data
/// kind) and `{axis}` (`x` or `z`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReferenceNames {
    /// Attribute names on the data group, tried in order
    pub attribute_templates: Vec<String>,

    /// Dataset names next to the actual x/z datasets, tried in order
    pub dataset_templates: Vec<String>,
}

impl Default for ReferenceNames {
    fn default() -> Self {
        Self {
            attribute_templates: vec![
                "{Kind} ref {axis}".to_string(),
                "{kind} ref {axis}".to_string(),
                "ref_{axis}".to_string(),
                "reference_{axis}".to_string(),
            ],
            dataset_templates: vec!["ref_{axis}".to_string()],
        }
    }
}

impl ReferenceNames {
    /// Attribute names to try for one kind and axis
    pub fn attribute_names(&self, kind: DataKind, axis: CurveAxis) -> Vec<String> {
        Self::expand_all(&self.attribute_templates, kind, axis)
    }

    /// Sibling dataset names to try for one kind and axis
    pub fn dataset_names(&self, kind: DataKind, axis: CurveAxis) -> Vec<String> {
        Self::expand_all(&self.dataset_templates, kind, axis)
    }

    fn expand_all(templates: &[String], kind: DataKind, axis: CurveAxis) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(templates.len());
        for template in templates {
            let name = template
                .replace("{Kind}", kind.label())
                .replace("{kind}", kind.keyword())
                .replace("{axis}", axis.name());
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
