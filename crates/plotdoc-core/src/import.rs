//! Importing data into the document from text and files.
//!
//! Each import installs all the datasets it read as one mutation. Linked
//! imports attach a single shared [`Linkage`] to every dataset they produce.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use serde::Serialize;
use tracing::{info, warn};

use plotdoc_ingest::{
    Descriptor, ReadOutput, ReaderOptions, SimpleReader, read_fits, read_grid_file,
    read_grid_string, read_grids, read_string,
};
use plotdoc_model::{
    FitsColumns, Grid2DOptions, HduRef, Linkage, Linked2DFile, LinkedFile, LinkedFitsFile,
    LiteralDataset,
};

use crate::document::Document;
use crate::error::Result;

/// Names read by an import and their count of unreadable values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub names: Vec<String>,
    /// Only datasets with at least one bad value are listed.
    pub invalid: BTreeMap<String, usize>,
}

impl Document {
    /// Read columns from `text` as described by `descriptor`, e.g. `x,+- y`.
    pub fn import_string(&mut self, descriptor: &str, text: &str) -> Result<ImportSummary> {
        let output = read_string(descriptor, text, ReaderOptions::default())?;
        Ok(self.install_columns(output, None))
    }

    /// Read columns from a file. With `linked`, the datasets remember the
    /// file so they can be reloaded and are saved as an import statement.
    pub fn import_file(
        &mut self,
        path: &Path,
        descriptor: &str,
        linked: bool,
        use_blocks: bool,
    ) -> Result<ImportSummary> {
        let link = linked.then(|| {
            Rc::new(Linkage::from(LinkedFile {
                filename: path.to_path_buf(),
                descriptor: descriptor.to_string(),
                use_blocks,
            }))
        });
        let output = read_simple_file(path, descriptor, use_blocks)?;
        let summary = self.install_columns(output, link);
        info!(
            path = %path.display(),
            datasets = summary.names.len(),
            linked,
            "imported data file"
        );
        Ok(summary)
    }

    pub(crate) fn install_columns(
        &mut self,
        output: ReadOutput,
        link: Option<Rc<Linkage>>,
    ) -> ImportSummary {
        let names = output.names();
        for (name, columns) in output.datasets {
            let dataset = LiteralDataset::new(columns).with_link(link.clone());
            self.datasets.insert(name, dataset.into());
        }
        for (name, count) in &output.invalid {
            warn!(dataset = %name, count, "values could not be read");
        }
        self.touch();
        ImportSummary {
            names,
            invalid: output.invalid,
        }
    }

    /// Read one grid embedded in a saved document.
    pub fn import_string_2d(&mut self, name: &str, text: &str) -> Result<()> {
        let dataset = read_grid_string(name, text)?;
        self.datasets.insert(name.to_string(), dataset.into());
        self.touch();
        Ok(())
    }

    /// Read one grid per name from consecutive blocks of `text`.
    pub fn import_strings_2d(&mut self, names: &[String], text: &str) -> Result<()> {
        let grids = read_grids(text, names, &Grid2DOptions::default())?;
        for (name, grid) in grids {
            self.datasets.insert(name, grid.into());
        }
        self.touch();
        Ok(())
    }

    /// Read one grid per name from consecutive blocks of a file.
    pub fn import_2d(
        &mut self,
        path: &Path,
        datasets: &[String],
        options: &Grid2DOptions,
        linked: bool,
    ) -> Result<Vec<String>> {
        let link = linked.then(|| {
            Rc::new(Linkage::from(Linked2DFile {
                filename: path.to_path_buf(),
                datasets: datasets.to_vec(),
                options: options.clone(),
            }))
        });
        self.import_2d_with_link(path, datasets, options, link)
    }

    pub(crate) fn import_2d_with_link(
        &mut self,
        path: &Path,
        datasets: &[String],
        options: &Grid2DOptions,
        link: Option<Rc<Linkage>>,
    ) -> Result<Vec<String>> {
        let grids = read_grid_file(path, datasets, options)?;
        let mut names = Vec::with_capacity(grids.len());
        for (name, grid) in grids {
            self.datasets
                .insert(name.clone(), grid.with_link(link.clone()).into());
            names.push(name);
        }
        self.touch();
        info!(path = %path.display(), datasets = names.len(), "imported 2D data file");
        Ok(names)
    }

    /// Read one HDU of a FITS file through the registered [`FitsSource`].
    ///
    /// [`FitsSource`]: plotdoc_ingest::FitsSource
    pub fn import_fits(
        &mut self,
        dataset: &str,
        path: &Path,
        hdu: HduRef,
        columns: FitsColumns,
        linked: bool,
    ) -> Result<()> {
        let fits = LinkedFitsFile {
            dataset: dataset.to_string(),
            filename: path.to_path_buf(),
            hdu,
            columns,
        };
        let link = linked.then(|| Rc::new(Linkage::from(fits.clone())));
        self.import_fits_with_link(&fits, link)
    }

    pub(crate) fn import_fits_with_link(
        &mut self,
        fits: &LinkedFitsFile,
        link: Option<Rc<Linkage>>,
    ) -> Result<()> {
        let mut dataset = read_fits(
            self.fits_source.as_deref(),
            &fits.dataset,
            &fits.filename,
            &fits.hdu,
            &fits.columns,
        )?;
        dataset.set_linked(link);
        self.datasets.insert(fits.dataset.clone(), dataset);
        self.touch();
        info!(dataset = %fits.dataset, path = %fits.filename.display(), "imported FITS data");
        Ok(())
    }
}

pub(crate) fn read_simple_file(path: &Path, descriptor: &str, use_blocks: bool) -> Result<ReadOutput> {
    let reader = SimpleReader::new(
        Descriptor::parse(descriptor)?,
        ReaderOptions::default().with_blocks(use_blocks),
    );
    Ok(reader.read_file(path)?)
}
