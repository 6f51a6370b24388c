//! Dataset and linkage definitions shared by the plotdoc crates.
//!
//! A dataset is one of three lifecycle kinds: literal values held directly,
//! a 2-D grid, or an expression computed from other datasets. Literal and grid
//! datasets may additionally carry a [`Linkage`] naming the file they were read
//! from, so they can be re-read later.

pub mod columns;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod link;

pub use columns::{Columns, DatasetPart};
pub use dataset::{
    Dataset, DatasetKind, EvaluationGuard, ExpressionDataset, ExpressionParts, Grid2DDataset,
    LiteralDataset,
};
pub use error::{DatasetExpressionError, ModelError, Result};
pub use grid::Grid;
pub use link::{
    FitsColumns, Grid2DOptions, HduRef, Linkage, Linked2DFile, LinkedFile, LinkedFitsFile,
    same_link,
};
