use std::path::PathBuf;

use serde::Serialize;

use plotdoc_core::ReloadSummary;
use plotdoc_model::Columns;

/// One widget in a tree listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub name: String,
    /// Widget type name, e.g. `graph`.
    pub kind: String,
    pub description: String,
    /// Distance below the listing's starting widget.
    pub depth: usize,
}

/// Values of a single dataset, as printed by `plotdoc get`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DatasetDump {
    Values(Columns),
    Grid {
        xrange: (f64, f64),
        yrange: (f64, f64),
        rows: Vec<Vec<f64>>,
    },
}

/// Outcome of `plotdoc reload`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReloadResult {
    pub summary: ReloadSummary,
    pub saved_to: PathBuf,
}
