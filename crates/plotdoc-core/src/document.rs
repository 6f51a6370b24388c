//! The document: named datasets plus the widget tree.
//!
//! Every mutation goes through [`Document::touch`], which bumps the changeset
//! counter, sets the modified flag and notifies observers. The changeset is
//! the only staleness signal expression datasets look at.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use plotdoc_ingest::FitsSource;
use plotdoc_model::{
    Columns, Dataset, DatasetKind, DatasetPart, ExpressionDataset, ExpressionParts,
    LiteralDataset,
};

use crate::error::{DocumentError, Result};
use crate::events::{DocumentEvent, ObserverId, Observers};
use crate::path;
use crate::settings::{SettingPath, SettingValue};
use crate::tree::{WidgetId, WidgetKind, WidgetTree};

/// One row of a dataset listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub kind: DatasetKind,
    pub dimensions: usize,
    /// Number of values, or `rows x columns` cells for grids.
    pub size: Option<usize>,
    pub range: Option<(f64, f64)>,
    /// Source file of linked datasets.
    pub linked: Option<String>,
    /// Evaluation failure of expression datasets.
    pub error: Option<String>,
}

pub struct Document {
    pub(crate) datasets: BTreeMap<String, Dataset>,
    pub(crate) tree: WidgetTree,
    changeset: u64,
    modified: bool,
    observers: Observers,
    pub(crate) fits_source: Option<Rc<dyn FitsSource>>,
    /// Nesting depth of expression evaluations in progress.
    pub(crate) eval_depth: Cell<usize>,
    /// Set when a nested evaluation re-entered a dataset already being evaluated.
    pub(crate) circular: RefCell<Option<String>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("datasets", &self.datasets)
            .field("tree", &self.tree)
            .field("changeset", &self.changeset)
            .field("modified", &self.modified)
            .field("observers", &self.observers)
            .field("fits_source", &self.fits_source.is_some())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            datasets: BTreeMap::new(),
            tree: WidgetTree::new(),
            changeset: 0,
            modified: false,
            observers: Observers::default(),
            fits_source: None,
            eval_depth: Cell::new(0),
            circular: RefCell::new(None),
        }
    }

    // ========================================================================
    // Lifecycle and notification
    // ========================================================================

    /// Discard all datasets and widgets.
    ///
    /// Observers see `Modified { modified: false, .. }` followed by `Wiped`.
    pub fn wipe(&mut self) {
        self.datasets.clear();
        self.tree = WidgetTree::new();
        self.changeset += 1;
        self.modified = false;
        self.observers.notify(&DocumentEvent::Modified {
            modified: false,
            changeset: self.changeset,
        });
        self.observers.notify(&DocumentEvent::Wiped);
        debug!(changeset = self.changeset, "document wiped");
    }

    /// No widgets and no datasets.
    pub fn is_blank(&self) -> bool {
        self.tree.is_empty() && self.datasets.is_empty()
    }

    pub fn changeset(&self) -> u64 {
        self.changeset
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Set or clear the modified flag.
    ///
    /// Setting it counts as a mutation. Clearing it (after a save) only
    /// notifies, since no data changed.
    pub fn set_modified(&mut self, modified: bool) {
        if modified {
            self.touch();
        } else {
            self.modified = false;
            self.observers.notify(&DocumentEvent::Modified {
                modified: false,
                changeset: self.changeset,
            });
        }
    }

    /// Record one mutation.
    pub(crate) fn touch(&mut self) {
        self.changeset += 1;
        self.modified = true;
        self.observers.notify(&DocumentEvent::Modified {
            modified: true,
            changeset: self.changeset,
        });
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&DocumentEvent) + 'static) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Returns `false` if the observer was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Reader used by FITS imports and reloads.
    pub fn set_fits_source(&mut self, source: Option<Rc<dyn FitsSource>>) {
        self.fits_source = source;
    }

    // ========================================================================
    // Widgets
    // ========================================================================

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn resolve(&self, origin: WidgetId, path: &str) -> Result<WidgetId> {
        Ok(path::resolve(&self.tree, origin, path)?)
    }

    pub fn add_widget(
        &mut self,
        parent: WidgetId,
        kind: WidgetKind,
        name: Option<&str>,
        autoadd: bool,
    ) -> Result<WidgetId> {
        let id = self.tree.add(parent, kind, name, autoadd)?;
        self.touch();
        Ok(id)
    }

    pub fn remove_widget(&mut self, id: WidgetId) -> Result<()> {
        self.tree.remove(id)?;
        self.touch();
        Ok(())
    }

    pub fn setting(&self, id: WidgetId, path: &SettingPath) -> Result<&SettingValue> {
        Ok(self.tree.node(id)?.settings.get(path)?.value())
    }

    pub fn set_setting(
        &mut self,
        id: WidgetId,
        path: &SettingPath,
        value: SettingValue,
    ) -> Result<()> {
        self.tree.node_mut(id)?.settings.set(path, value)?;
        self.touch();
        Ok(())
    }

    // ========================================================================
    // Datasets
    // ========================================================================

    /// Install a dataset, replacing any dataset of the same name.
    pub fn set_dataset(&mut self, name: &str, dataset: impl Into<Dataset>) {
        let dataset = dataset.into();
        debug!(dataset = %name, kind = %dataset.kind(), "set dataset");
        self.datasets.insert(name.to_string(), dataset);
        self.touch();
    }

    /// Install literal values with optional errors.
    pub fn set_data(
        &mut self,
        name: &str,
        data: Vec<f64>,
        serr: Option<Vec<f64>>,
        nerr: Option<Vec<f64>>,
        perr: Option<Vec<f64>>,
    ) -> Result<()> {
        let dataset = LiteralDataset::from_parts(data, serr, nerr, perr)?;
        self.set_dataset(name, dataset);
        Ok(())
    }

    /// Install a dataset computed from formulas. The formulas are checked
    /// when the dataset is first read.
    pub fn set_data_expression(&mut self, name: &str, parts: ExpressionParts) {
        self.set_dataset(name, ExpressionDataset::new(parts));
    }

    pub fn dataset(&self, name: &str) -> Result<&Dataset> {
        self.datasets
            .get(name)
            .ok_or_else(|| DocumentError::DatasetNotFound(name.to_string()))
    }

    fn dataset_mut(&mut self, name: &str) -> Result<&mut Dataset> {
        self.datasets
            .get_mut(name)
            .ok_or_else(|| DocumentError::DatasetNotFound(name.to_string()))
    }

    pub fn has_dataset(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Dataset names in sorted order.
    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    pub fn delete_dataset(&mut self, name: &str) -> Result<Dataset> {
        let dataset = self
            .datasets
            .remove(name)
            .ok_or_else(|| DocumentError::DatasetNotFound(name.to_string()))?;
        self.touch();
        Ok(dataset)
    }

    /// Move a dataset to a new name, replacing any dataset already there.
    ///
    /// A file link re-reads the dataset under its old name, so a renamed
    /// dataset is unlinked.
    pub fn rename_dataset(&mut self, old: &str, new: &str) -> Result<()> {
        let mut dataset = self
            .datasets
            .remove(old)
            .ok_or_else(|| DocumentError::DatasetNotFound(old.to_string()))?;
        if old != new {
            dataset.set_linked(None);
        }
        self.datasets.insert(new.to_string(), dataset);
        self.touch();
        Ok(())
    }

    /// Copy a dataset under a new name without its file link.
    ///
    /// Expression datasets are copied as literal values computed now.
    pub fn duplicate_dataset(&mut self, name: &str, new: &str) -> Result<()> {
        if self.datasets.contains_key(new) {
            return Err(DocumentError::collision(new));
        }
        let copy: Dataset = match self.dataset(name)? {
            Dataset::Literal(ds) => ds.duplicate().into(),
            Dataset::Grid2D(ds) => ds.duplicate().into(),
            Dataset::Expression(_) => {
                let columns = self.columns(name)?;
                LiteralDataset::new(Columns::clone(&columns)).into()
            }
        };
        self.datasets.insert(new.to_string(), copy);
        self.touch();
        Ok(())
    }

    /// Drop the file link; the values stay.
    pub fn unlink_dataset(&mut self, name: &str) -> Result<()> {
        self.dataset_mut(name)?.set_linked(None);
        self.touch();
        Ok(())
    }

    /// Replace one part of a literal dataset. Nothing changes on failure.
    pub fn change_values(
        &mut self,
        name: &str,
        part: DatasetPart,
        values: Option<Vec<f64>>,
    ) -> Result<()> {
        match self.dataset_mut(name)? {
            Dataset::Literal(ds) => ds.change_values(part, values)?,
            other => {
                return Err(DocumentError::WrongKind {
                    name: name.to_string(),
                    expected: "a literal dataset",
                    found: other.kind(),
                });
            }
        }
        self.touch();
        Ok(())
    }

    /// Minimum and maximum over the values and their error bars, or of the
    /// grid cells for 2-D data.
    pub fn dataset_range(&self, name: &str) -> Result<Option<(f64, f64)>> {
        match self.dataset(name)? {
            Dataset::Grid2D(ds) => Ok(ds.grid.data_range()),
            _ => Ok(self.columns(name)?.range()),
        }
    }

    pub fn dataset_is_empty(&self, name: &str) -> Result<bool> {
        match self.dataset(name)? {
            Dataset::Grid2D(ds) => Ok(ds.grid.values().is_empty()),
            _ => Ok(self.columns(name)?.is_empty()),
        }
    }

    /// One summary per dataset, sorted by name.
    pub fn dataset_summaries(&self) -> Vec<DatasetSummary> {
        self.datasets
            .iter()
            .map(|(name, dataset)| {
                let mut summary = DatasetSummary {
                    name: name.clone(),
                    kind: dataset.kind(),
                    dimensions: dataset.dimensions(),
                    size: None,
                    range: None,
                    linked: dataset
                        .linked()
                        .map(|link| link.filename().display().to_string()),
                    error: None,
                };
                match dataset {
                    Dataset::Grid2D(ds) => {
                        summary.size = Some(ds.grid.values().len());
                        summary.range = ds.grid.data_range();
                    }
                    _ => match self.columns(name) {
                        Ok(columns) => {
                            summary.size = Some(columns.len());
                            summary.range = columns.range();
                        }
                        Err(err) => summary.error = Some(err.to_string()),
                    },
                }
                summary
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(doc: &mut Document) -> Rc<RefCell<Vec<DocumentEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        doc.subscribe(move |event| sink.borrow_mut().push(*event));
        events
    }

    #[test]
    fn test_each_mutation_bumps_changeset_once() {
        let mut doc = Document::new();
        let events = recorder(&mut doc);
        doc.set_data("a", vec![1.0, 2.0], None, None, None).unwrap();
        doc.rename_dataset("a", "b").unwrap();
        doc.unlink_dataset("b").unwrap();
        assert_eq!(doc.changeset(), 3);
        assert!(doc.is_modified());
        assert_eq!(
            events.borrow().last(),
            Some(&DocumentEvent::Modified {
                modified: true,
                changeset: 3
            })
        );
    }

    #[test]
    fn test_clearing_modified_keeps_changeset() {
        let mut doc = Document::new();
        doc.set_data("a", vec![1.0], None, None, None).unwrap();
        let events = recorder(&mut doc);
        doc.set_modified(false);
        assert_eq!(doc.changeset(), 1);
        assert!(!doc.is_modified());
        assert_eq!(
            *events.borrow(),
            vec![DocumentEvent::Modified {
                modified: false,
                changeset: 1
            }]
        );
    }

    #[test]
    fn test_wipe_notifies_and_clears() {
        let mut doc = Document::new();
        doc.add_widget(WidgetId::ROOT, WidgetKind::Page, None, true)
            .unwrap();
        doc.set_data("a", vec![1.0], None, None, None).unwrap();
        assert!(!doc.is_blank());
        let events = recorder(&mut doc);
        doc.wipe();
        assert!(doc.is_blank());
        assert!(!doc.is_modified());
        assert_eq!(events.borrow().last(), Some(&DocumentEvent::Wiped));
    }

    #[test]
    fn test_change_values_rejects_mismatch_before_commit() {
        let mut doc = Document::new();
        doc.set_data("a", vec![1.0, 2.0], Some(vec![0.1, 0.1]), None, None)
            .unwrap();
        let before = doc.changeset();
        let err = doc
            .change_values("a", DatasetPart::Values, Some(vec![1.0, 2.0, 3.0]))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Model(_)));
        assert_eq!(doc.changeset(), before);
        assert_eq!(doc.columns("a").unwrap().data, vec![1.0, 2.0]);
    }

    #[test]
    fn test_change_values_needs_literal() {
        let mut doc = Document::new();
        doc.set_data_expression("e", ExpressionParts::values("1"));
        assert!(matches!(
            doc.change_values("e", DatasetPart::Values, Some(vec![1.0])),
            Err(DocumentError::WrongKind { found: DatasetKind::Expression, .. })
        ));
    }

    #[test]
    fn test_rename_overwrites_target() {
        let mut doc = Document::new();
        doc.set_data("a", vec![1.0], None, None, None).unwrap();
        doc.set_data("b", vec![2.0], None, None, None).unwrap();
        doc.rename_dataset("a", "b").unwrap();
        assert_eq!(doc.dataset_names(), vec!["b"]);
        assert_eq!(doc.columns("b").unwrap().data, vec![1.0]);
        assert!(matches!(
            doc.rename_dataset("zz", "y"),
            Err(DocumentError::DatasetNotFound(name)) if name == "zz"
        ));
    }

    #[test]
    fn test_dataset_range_includes_errors() {
        let mut doc = Document::new();
        doc.set_data("a", vec![1.0, 5.0], Some(vec![0.5, 1.0]), None, None)
            .unwrap();
        assert_eq!(doc.dataset_range("a").unwrap(), Some((0.5, 6.0)));
        assert!(!doc.dataset_is_empty("a").unwrap());
    }
}
