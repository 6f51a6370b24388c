//! Reader for two-dimensional grids stored as text.
//!
//! Each dataset is one block of lines terminated by a blank line or the end
//! of the input. A block may start with header lines (`xrange A B`,
//! `yrange A B`, `invertrows`, `invertcols`, `transpose`) followed by rows of
//! numbers. Rows are written lowest y first; the stored grid keeps the highest
//! y in row 0. When several datasets are read from one input, each takes the
//! next block.

use std::path::Path;

use tracing::debug;

use plotdoc_model::{Grid, Grid2DDataset, Grid2DOptions};

use crate::error::{IngestError, Result};

#[derive(Debug, Default)]
struct BlockHeader {
    xrange: Option<(f64, f64)>,
    yrange: Option<(f64, f64)>,
    invert_rows: bool,
    invert_cols: bool,
    transpose: bool,
}

struct Lines<'a> {
    inner: std::iter::Peekable<std::iter::Enumerate<std::str::Lines<'a>>>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate().peekable(),
        }
    }

    /// Next raw line with its 1-based number.
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        self.inner.next().map(|(index, line)| (index + 1, line))
    }

    fn skip_blank(&mut self) {
        while self
            .inner
            .peek()
            .is_some_and(|(_, line)| strip_comment(line).is_empty())
        {
            self.inner.next();
        }
    }
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default().trim()
}

/// Read one grid per name from consecutive blocks of `text`.
///
/// Values in `options` take precedence over header lines in the data.
pub fn read_grids(
    text: &str,
    names: &[String],
    options: &Grid2DOptions,
) -> Result<Vec<(String, Grid2DDataset)>> {
    let mut lines = Lines::new(text);
    names
        .iter()
        .map(|name| {
            let dataset = read_block(&mut lines, name, options)?;
            debug!(
                dataset = %name,
                width = dataset.grid.width(),
                height = dataset.grid.height(),
                "read 2D block"
            );
            Ok((name.clone(), dataset))
        })
        .collect()
}

pub fn read_grid_file(
    path: &Path,
    names: &[String],
    options: &Grid2DOptions,
) -> Result<Vec<(String, Grid2DDataset)>> {
    let text = std::fs::read_to_string(path).map_err(|err| IngestError::io(path, err))?;
    read_grids(&text, names, options)
}

/// Read a single grid, as embedded in a saved document.
pub fn read_grid_string(name: &str, text: &str) -> Result<Grid2DDataset> {
    let mut lines = Lines::new(text);
    read_block(&mut lines, name, &Grid2DOptions::default())
}

fn read_block(lines: &mut Lines<'_>, name: &str, options: &Grid2DOptions) -> Result<Grid2DDataset> {
    lines.skip_blank();
    let mut header = BlockHeader::default();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut first_line = None;

    while let Some((number, raw)) = lines.next_line() {
        if raw.trim().is_empty() {
            break;
        }
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }
        first_line.get_or_insert(number);
        let mut items = line
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|item| !item.is_empty());
        let Some(first) = items.next() else {
            continue;
        };
        if first.starts_with(|ch: char| ch.is_ascii_alphabetic()) && first.parse::<f64>().is_err()
        {
            if !rows.is_empty() {
                return Err(IngestError::grid(
                    name,
                    Some(number),
                    format!("header '{first}' after data rows"),
                ));
            }
            parse_header(&mut header, first, items, name, number)?;
            continue;
        }
        let row = std::iter::once(first)
            .chain(items)
            .map(|item| {
                item.parse::<f64>().map_err(|_| {
                    IngestError::grid(name, Some(number), format!("invalid number '{item}'"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if let Some(expected) = rows.first().map(Vec::len)
            && row.len() != expected
        {
            return Err(IngestError::grid(
                name,
                Some(number),
                format!("row has {} values, expected {expected}", row.len()),
            ));
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(IngestError::grid(name, first_line, "no data rows found"));
    }

    // file order is lowest y first
    rows.reverse();
    let mut grid = Grid::from_rows(rows)?;

    if options.invert_rows.unwrap_or(header.invert_rows) {
        grid.reverse_rows();
    }
    if options.invert_cols.unwrap_or(header.invert_cols) {
        grid.reverse_cols();
    }
    if options.transpose.unwrap_or(header.transpose) {
        grid.transpose();
    }

    Ok(Grid2DDataset::new(
        grid,
        options.xrange.or(header.xrange),
        options.yrange.or(header.yrange),
    ))
}

fn parse_header<'a>(
    header: &mut BlockHeader,
    keyword: &str,
    mut args: impl Iterator<Item = &'a str>,
    name: &str,
    line: usize,
) -> Result<()> {
    let mut range = || -> Result<(f64, f64)> {
        let mut next = || {
            args.next()
                .and_then(|item| item.parse::<f64>().ok())
                .ok_or_else(|| {
                    IngestError::grid(name, Some(line), format!("'{keyword}' needs two numbers"))
                })
        };
        Ok((next()?, next()?))
    };
    match keyword.to_ascii_lowercase().as_str() {
        "xrange" => header.xrange = Some(range()?),
        "yrange" => header.yrange = Some(range()?),
        "invertrows" => header.invert_rows = true,
        "invertcols" => header.invert_cols = true,
        "transpose" => header.transpose = true,
        _ => {
            return Err(IngestError::grid(
                name,
                Some(line),
                format!("unknown header '{keyword}'"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_stored_highest_y_first() {
        let ds = read_grid_string("img", "xrange 0 3\nyrange -1 1\n1 2 3\n4 5 6\n").unwrap();
        assert_eq!(ds.grid.row(0), &[4.0, 5.0, 6.0]);
        assert_eq!(ds.grid.row(1), &[1.0, 2.0, 3.0]);
        assert_eq!(ds.xrange, (0.0, 3.0));
        assert_eq!(ds.yrange, (-1.0, 1.0));
    }

    #[test]
    fn test_options_override_header() {
        let options = Grid2DOptions::default().with_xrange((5.0, 6.0));
        let grids = read_grids(
            "xrange 0 1\n1 2\n",
            &["a".to_string()],
            &options,
        )
        .unwrap();
        assert_eq!(grids[0].1.xrange, (5.0, 6.0));
        assert_eq!(grids[0].1.yrange, (0.0, 1.0));
    }

    #[test]
    fn test_sequential_blocks() {
        let text = "# first\n1 2\n3 4\n\n\ntranspose\n1 2 3\n";
        let grids = read_grids(text, &["a".to_string(), "b".to_string()], &Grid2DOptions::default())
            .unwrap();
        assert_eq!(grids[0].1.grid.width(), 2);
        assert_eq!(grids[1].1.grid.width(), 1);
        assert_eq!(grids[1].1.grid.height(), 3);
    }

    #[test]
    fn test_errors_name_dataset_and_line() {
        let err = read_grid_string("img", "1 2\n3 x\n").unwrap_err();
        assert!(matches!(err, IngestError::Grid { line: Some(2), .. }));
        let err = read_grid_string("img", "1 2\n3\n").unwrap_err();
        assert!(matches!(err, IngestError::Grid { line: Some(2), .. }));
        assert!(err.to_string().contains("expected 2"));
        let err = read_grids("1\n", &["a".to_string(), "b".to_string()], &Grid2DOptions::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Grid { ref name, .. } if name == "b"));
    }
}
