//! FITS import contract.
//!
//! Decoding FITS files is delegated to a [`FitsSource`] registered with the
//! document. This module turns what the source returns into datasets: tables
//! become 1-D datasets built from named columns, images become 2-D grids with
//! coordinate ranges taken from the WCS header keywords.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use plotdoc_model::{Columns, Dataset, FitsColumns, Grid, Grid2DDataset, HduRef, LiteralDataset};

use crate::error::{IngestError, Result};

/// Contents of one header/data unit.
#[derive(Debug, Clone, PartialEq)]
pub enum HduContents {
    /// Binary or ASCII table, columns converted to numbers.
    Table { columns: BTreeMap<String, Vec<f64>> },
    /// Image data with row 0 at the top (highest y), plus numeric header keywords.
    Image {
        grid: Grid,
        header: BTreeMap<String, f64>,
    },
}

/// Reads HDUs from FITS files.
pub trait FitsSource {
    fn read_hdu(&self, path: &Path, hdu: &HduRef) -> Result<HduContents>;
}

/// Build the dataset for an HDU.
///
/// Column names apply to tables only; they are ignored (with a warning) for
/// images.
pub fn build_dataset(name: &str, contents: HduContents, columns: &FitsColumns) -> Result<Dataset> {
    match contents {
        HduContents::Table { columns: mut table } => {
            let Some(data_column) = columns.data.as_deref() else {
                return Err(IngestError::fits_column(
                    "",
                    format!("no data column given for dataset '{name}'"),
                ));
            };
            let mut take = |column: Option<&str>| -> Result<Option<Vec<f64>>> {
                column
                    .map(|column| {
                        table.remove(column).ok_or_else(|| {
                            IngestError::fits_column(column, "no such column in table")
                        })
                    })
                    .transpose()
            };
            let data = take(Some(data_column))?.unwrap_or_default();
            let serr = take(columns.serr.as_deref())?;
            let nerr = take(columns.nerr.as_deref())?;
            let perr = take(columns.perr.as_deref())?;
            let columns = Columns::new(data, serr, nerr, perr)?;
            Ok(LiteralDataset::new(columns).into())
        }
        HduContents::Image { grid, header } => {
            if !columns.is_empty() {
                warn!(dataset = %name, "ignoring FITS columns when importing an image");
            }
            let ranges = wcs_ranges(&header, grid.width(), grid.height());
            let (xrange, yrange) = match ranges {
                Some((x, y)) => (Some(x), Some(y)),
                None => (None, None),
            };
            Ok(Grid2DDataset::new(grid, xrange, yrange).into())
        }
    }
}

/// Coordinate ranges from `CRVALn`, `CRPIXn` and `CDELTn`, or `None` when any
/// keyword is missing.
///
/// Pixel `p` maps to `(p - CRPIX) * CDELT + CRVAL`; the ranges run from pixel
/// 0 to the image edge.
pub fn wcs_ranges(
    header: &BTreeMap<String, f64>,
    width: usize,
    height: usize,
) -> Option<((f64, f64), (f64, f64))> {
    let key = |name: &str| header.get(name).copied();
    let axis = |n: u8, pixels: usize| -> Option<(f64, f64)> {
        let crval = key(&format!("CRVAL{n}"))?;
        let crpix = key(&format!("CRPIX{n}"))?;
        let cdelt = key(&format!("CDELT{n}"))?;
        let at = |pixel: f64| (pixel - crpix) * cdelt + crval;
        Some((at(0.0), at(pixels as f64)))
    };
    Some((axis(1, width)?, axis(2, height)?))
}

/// Read through `source`, failing with [`IngestError::FitsUnavailable`] when
/// no source is registered.
pub fn read_fits(
    source: Option<&dyn FitsSource>,
    name: &str,
    path: &Path,
    hdu: &HduRef,
    columns: &FitsColumns,
) -> Result<Dataset> {
    let source = source.ok_or(IngestError::FitsUnavailable)?;
    let contents = source.read_hdu(path, hdu)?;
    build_dataset(name, contents, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
        values
            .iter()
            .map(|(key, value)| ((*key).to_string(), *value))
            .collect()
    }

    #[test]
    fn test_wcs_ranges() {
        let header = header(&[
            ("CRVAL1", 10.0),
            ("CRPIX1", 1.0),
            ("CDELT1", 2.0),
            ("CRVAL2", 0.0),
            ("CRPIX2", 0.0),
            ("CDELT2", 0.5),
        ]);
        let (x, y) = wcs_ranges(&header, 4, 2).unwrap();
        assert_eq!(x, (8.0, 16.0));
        assert_eq!(y, (0.0, 1.0));
    }

    #[test]
    fn test_missing_wcs_keyword() {
        let header = header(&[("CRVAL1", 10.0)]);
        assert!(wcs_ranges(&header, 4, 2).is_none());
    }

    #[test]
    fn test_table_columns() {
        let contents = HduContents::Table {
            columns: BTreeMap::from([
                ("FLUX".to_string(), vec![1.0, 2.0]),
                ("ERR".to_string(), vec![0.1, 0.2]),
            ]),
        };
        let columns = FitsColumns {
            data: Some("FLUX".to_string()),
            serr: Some("ERR".to_string()),
            ..FitsColumns::default()
        };
        let ds = build_dataset("flux", contents, &columns).unwrap();
        let literal = ds.as_literal().unwrap();
        assert_eq!(literal.columns().serr, Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_missing_column_and_source() {
        let contents = HduContents::Table {
            columns: BTreeMap::new(),
        };
        let columns = FitsColumns {
            data: Some("FLUX".to_string()),
            ..FitsColumns::default()
        };
        let err = build_dataset("flux", contents, &columns).unwrap_err();
        assert!(matches!(err, IngestError::FitsColumn { ref column, .. } if column == "FLUX"));

        let err = read_fits(None, "flux", Path::new("a.fits"), &HduRef::Index(1), &columns)
            .unwrap_err();
        assert!(matches!(err, IngestError::FitsUnavailable));
    }
}
