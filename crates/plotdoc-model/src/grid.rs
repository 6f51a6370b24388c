use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Rectangular numeric grid stored row-major.
///
/// Row 0 is the top of the image (highest y).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Build a grid from rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(ModelError::EmptyGrid);
        };
        let cols = first.len();
        if cols == 0 {
            return Err(ModelError::EmptyGrid);
        }
        let mut values = Vec::with_capacity(cols * rows.len());
        for (row, data) in rows.iter().enumerate() {
            if data.len() != cols {
                return Err(ModelError::RaggedGrid {
                    row,
                    expected: cols,
                    actual: data.len(),
                });
            }
            values.extend_from_slice(data);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            values,
        })
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.values[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.values[start..start + self.cols]
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[f64]> + '_ {
        self.values.chunks(self.cols.max(1))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn reverse_rows(&mut self) {
        let cols = self.cols;
        let mut flipped = Vec::with_capacity(self.values.len());
        for row in self.values.chunks(cols.max(1)).rev() {
            flipped.extend_from_slice(row);
        }
        self.values = flipped;
    }

    pub fn reverse_cols(&mut self) {
        for row in self.values.chunks_mut(self.cols.max(1)) {
            row.reverse();
        }
    }

    pub fn transpose(&mut self) {
        let mut transposed = Vec::with_capacity(self.values.len());
        for col in 0..self.cols {
            for row in 0..self.rows {
                transposed.push(self.values[row * self.cols + col]);
            }
        }
        std::mem::swap(&mut self.rows, &mut self.cols);
        self.values = transposed;
    }

    /// Minimum and maximum over the finite values.
    pub fn data_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
