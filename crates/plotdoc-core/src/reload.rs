//! Re-reading linked files.
//!
//! Each distinct link is read into a scratch document first. A live dataset
//! is replaced only if it still carries that same link object, so data the
//! user re-assigned or unlinked under the same name is left alone.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use tracing::{info, warn};

use plotdoc_model::{Linkage, same_link};

use crate::document::Document;
use crate::error::Result;
use crate::import::read_simple_file;

/// Outcome of [`Document::reload_linked_datasets`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    /// Datasets refreshed, sorted.
    pub read: Vec<String>,
    /// Per-dataset error counts: unreadable values, or 1 when the whole
    /// file failed. 2-D and FITS links list every dataset they read, with 0
    /// on success.
    pub errors: BTreeMap<String, usize>,
}

impl ReloadSummary {
    pub fn has_errors(&self) -> bool {
        self.errors.values().any(|count| *count > 0)
    }
}

impl Document {
    /// Re-read every linked file once and refresh the datasets still linked
    /// to it. Failures are reported per dataset in the summary.
    pub fn reload_linked_datasets(&mut self) -> ReloadSummary {
        let mut links: Vec<Rc<Linkage>> = Vec::new();
        for dataset in self.datasets.values() {
            if let Some(link) = dataset.linked()
                && !links.iter().any(|seen| Rc::ptr_eq(seen, link))
            {
                links.push(Rc::clone(link));
            }
        }

        let mut summary = ReloadSummary::default();
        for link in &links {
            let mut scratch = Document::new();
            scratch.fits_source = self.fits_source.clone();
            match scratch.read_link(link) {
                Ok(invalid) => {
                    for (name, mut dataset) in std::mem::take(&mut scratch.datasets) {
                        let still_linked = self
                            .datasets
                            .get(&name)
                            .is_some_and(|live| same_link(live.linked(), link));
                        if !still_linked {
                            continue;
                        }
                        dataset.set_linked(Some(Rc::clone(link)));
                        self.datasets.insert(name.clone(), dataset);
                        let count = invalid.get(&name).copied().unwrap_or_default();
                        if count > 0 || produced_names(link).is_some() {
                            summary.errors.insert(name.clone(), count);
                        }
                        summary.read.push(name);
                    }
                }
                Err(err) => {
                    warn!(link = %link.describe(), error = %err, "failed to reload linked file");
                    let names = produced_names(link).unwrap_or_else(|| {
                        self.datasets
                            .iter()
                            .filter(|(_, dataset)| same_link(dataset.linked(), link))
                            .map(|(name, _)| name.clone())
                            .collect()
                    });
                    for name in names {
                        summary.errors.insert(name, 1);
                    }
                }
            }
        }

        if !links.is_empty() {
            self.touch();
        }
        summary.read.sort();
        info!(
            links = links.len(),
            read = summary.read.len(),
            errors = summary.errors.values().filter(|count| **count > 0).count(),
            "reloaded linked datasets"
        );
        summary
    }

    /// Import a link's file into this document, returning the unreadable
    /// value counts.
    fn read_link(&mut self, link: &Rc<Linkage>) -> Result<BTreeMap<String, usize>> {
        match link.as_ref() {
            Linkage::File(file) => {
                let output = read_simple_file(&file.filename, &file.descriptor, file.use_blocks)?;
                Ok(self.install_columns(output, None).invalid)
            }
            Linkage::Grid2D(file) => {
                self.import_2d_with_link(&file.filename, &file.datasets, &file.options, None)?;
                Ok(BTreeMap::new())
            }
            Linkage::Fits(file) => {
                self.import_fits_with_link(file, None)?;
                Ok(BTreeMap::new())
            }
        }
    }
}

/// Dataset names a 2-D or FITS link always reads. Text-file names depend on
/// the file contents (blocks), so those links give `None`.
fn produced_names(link: &Linkage) -> Option<Vec<String>> {
    match link {
        Linkage::File(_) => None,
        Linkage::Grid2D(file) => Some(file.datasets.clone()),
        Linkage::Fits(file) => Some(vec![file.dataset.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use plotdoc_model::Grid2DOptions;

    fn write(path: &Path, text: &str) {
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_reload_refreshes_linked_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xy.dat");
        write(&path, "1 10\n2 20\n");

        let mut doc = Document::new();
        doc.import_file(&path, "x y", true, false).unwrap();
        doc.set_data("y", vec![7.0], None, None, None).unwrap();

        write(&path, "3 30\n4 40\n5 50\n");
        let before = doc.changeset();
        let summary = doc.reload_linked_datasets();

        assert_eq!(summary.read, vec!["x"]);
        assert!(summary.errors.is_empty());
        assert_eq!(doc.columns("x").unwrap().data, vec![3.0, 4.0, 5.0]);
        assert_eq!(doc.columns("y").unwrap().data, vec![7.0]);
        assert_eq!(doc.changeset(), before + 1);
        assert!(doc.dataset("x").unwrap().linked().is_some());
    }

    #[test]
    fn test_missing_file_counts_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.dat");
        write(&path, "1 2\n3 4\n");

        let mut doc = Document::new();
        doc.import_2d(&path, &["img".to_string()], &Grid2DOptions::default(), true)
            .unwrap();
        fs::remove_file(&path).unwrap();

        let summary = doc.reload_linked_datasets();
        assert!(summary.read.is_empty());
        assert_eq!(summary.errors.get("img"), Some(&1));
        assert!(summary.has_errors());
        assert_eq!(doc.dataset("img").unwrap().dimensions(), 2);
    }

    #[test]
    fn test_grid_links_report_every_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grids.dat");
        write(&path, "1 2\n3 4\n\n5 6\n7 8\n");
        let names = vec!["a".to_string(), "b".to_string()];

        let mut doc = Document::new();
        doc.import_2d(&path, &names, &Grid2DOptions::default(), true)
            .unwrap();
        doc.delete_dataset("b").unwrap();

        let summary = doc.reload_linked_datasets();
        assert_eq!(summary.read, vec!["a"]);
        assert_eq!(summary.errors, BTreeMap::from([("a".to_string(), 0)]));
        assert!(!summary.has_errors());

        fs::remove_file(&path).unwrap();
        let summary = doc.reload_linked_datasets();
        assert_eq!(
            summary.errors,
            BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 1)])
        );
    }

    #[test]
    fn test_no_links_is_not_a_mutation() {
        let mut doc = Document::new();
        doc.set_data("a", vec![1.0], None, None, None).unwrap();
        let summary = doc.reload_linked_datasets();
        assert_eq!(summary, ReloadSummary::default());
        assert_eq!(doc.changeset(), 1);
    }

    #[test]
    fn test_bad_values_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.dat");
        write(&path, "1\n2\n");

        let mut doc = Document::new();
        doc.import_file(&path, "x", true, false).unwrap();
        write(&path, "1\nbad\n3\n");
        let summary = doc.reload_linked_datasets();
        assert_eq!(summary.read, vec!["x"]);
        assert_eq!(summary.errors.get("x"), Some(&1));
    }
}
