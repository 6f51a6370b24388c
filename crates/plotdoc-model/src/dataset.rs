use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::columns::{Columns, DatasetPart};
use crate::error::{DatasetExpressionError, Result};
use crate::grid::Grid;
use crate::link::Linkage;

/// Lifecycle kind of a dataset, used for listings and type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Literal,
    Grid2D,
    Expression,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Literal => "literal",
            DatasetKind::Grid2D => "2d",
            DatasetKind::Expression => "expression",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1-D values with optional error bars, held directly.
#[derive(Debug, Clone, Default)]
pub struct LiteralDataset {
    columns: Columns,
    pub linked: Option<Rc<Linkage>>,
}

impl LiteralDataset {
    pub fn new(columns: Columns) -> Self {
        Self {
            columns,
            linked: None,
        }
    }

    pub fn from_parts(
        data: Vec<f64>,
        serr: Option<Vec<f64>>,
        nerr: Option<Vec<f64>>,
        perr: Option<Vec<f64>>,
    ) -> Result<Self> {
        Ok(Self::new(Columns::new(data, serr, nerr, perr)?))
    }

    pub fn with_link(mut self, link: Option<Rc<Linkage>>) -> Self {
        self.linked = link;
        self
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn data(&self) -> &[f64] {
        &self.columns.data
    }

    /// Replace one part; the dataset is unchanged if the lengths would disagree.
    pub fn change_values(&mut self, part: DatasetPart, values: Option<Vec<f64>>) -> Result<()> {
        self.columns.replace(part, values)
    }

    /// Copy of the values without the file link.
    pub fn duplicate(&self) -> Self {
        Self::new(self.columns.clone())
    }
}

/// Two-dimensional image data with coordinate ranges.
#[derive(Debug, Clone)]
pub struct Grid2DDataset {
    pub grid: Grid,
    pub xrange: (f64, f64),
    pub yrange: (f64, f64),
    pub linked: Option<Rc<Linkage>>,
}

impl Grid2DDataset {
    /// Ranges default to `(0, width)` and `(0, height)`.
    pub fn new(grid: Grid, xrange: Option<(f64, f64)>, yrange: Option<(f64, f64)>) -> Self {
        let xrange = xrange.unwrap_or((0.0, grid.width() as f64));
        let yrange = yrange.unwrap_or((0.0, grid.height() as f64));
        Self {
            grid,
            xrange,
            yrange,
            linked: None,
        }
    }

    pub fn with_link(mut self, link: Option<Rc<Linkage>>) -> Self {
        self.linked = link;
        self
    }

    pub fn data_ranges(&self) -> ((f64, f64), (f64, f64)) {
        (self.xrange, self.yrange)
    }

    pub fn duplicate(&self) -> Self {
        Self {
            linked: None,
            ..self.clone()
        }
    }
}

/// Formulas for the four parts of a derived dataset. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionParts {
    pub data: Option<String>,
    pub serr: Option<String>,
    pub nerr: Option<String>,
    pub perr: Option<String>,
}

impl ExpressionParts {
    pub fn values(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    pub fn get(&self, part: DatasetPart) -> Option<&str> {
        let expr = match part {
            DatasetPart::Values => self.data.as_deref(),
            DatasetPart::SymErr => self.serr.as_deref(),
            DatasetPart::NegErr => self.nerr.as_deref(),
            DatasetPart::PosErr => self.perr.as_deref(),
        };
        expr.filter(|text| !text.trim().is_empty())
    }
}

type Outcome = std::result::Result<Rc<Columns>, DatasetExpressionError>;

#[derive(Debug)]
struct Cached {
    version: u64,
    outcome: Outcome,
}

/// Dataset computed from formulas over other datasets.
///
/// Results are cached against the document changeset they were computed at.
#[derive(Debug, Default)]
pub struct ExpressionDataset {
    parts: ExpressionParts,
    cache: RefCell<Option<Cached>>,
    evaluations: Cell<u64>,
    evaluating: Cell<bool>,
}

impl Clone for ExpressionDataset {
    fn clone(&self) -> Self {
        Self::new(self.parts.clone())
    }
}

impl ExpressionDataset {
    pub fn new(parts: ExpressionParts) -> Self {
        Self {
            parts,
            cache: RefCell::new(None),
            evaluations: Cell::new(0),
            evaluating: Cell::new(false),
        }
    }

    pub fn parts(&self) -> &ExpressionParts {
        &self.parts
    }

    /// Number of times the formulas have been evaluated.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }

    /// The cached outcome if it was computed at `version`.
    pub fn cached(&self, version: u64) -> Option<Outcome> {
        self.cache
            .borrow()
            .as_ref()
            .filter(|cached| cached.version == version)
            .map(|cached| cached.outcome.clone())
    }

    pub fn last_eval_version(&self) -> Option<u64> {
        self.cache.borrow().as_ref().map(|cached| cached.version)
    }

    /// Mark the start of an evaluation. Returns `None` if one is already running,
    /// which means the formulas refer back to this dataset.
    pub fn begin_evaluation(&self) -> Option<EvaluationGuard<'_>> {
        if self.evaluating.replace(true) {
            return None;
        }
        self.evaluations.set(self.evaluations.get() + 1);
        Some(EvaluationGuard { dataset: self })
    }

    pub fn store(&self, version: u64, outcome: Outcome) {
        *self.cache.borrow_mut() = Some(Cached { version, outcome });
    }
}

/// Clears the in-progress flag of an [`ExpressionDataset`] when dropped.
pub struct EvaluationGuard<'a> {
    dataset: &'a ExpressionDataset,
}

impl Drop for EvaluationGuard<'_> {
    fn drop(&mut self) {
        self.dataset.evaluating.set(false);
    }
}

/// A named entry in the document's dataset mapping.
#[derive(Debug, Clone)]
pub enum Dataset {
    Literal(LiteralDataset),
    Grid2D(Grid2DDataset),
    Expression(ExpressionDataset),
}

impl Dataset {
    pub fn dimensions(&self) -> usize {
        match self {
            Dataset::Literal(_) | Dataset::Expression(_) => 1,
            Dataset::Grid2D(_) => 2,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Literal(_) => DatasetKind::Literal,
            Dataset::Grid2D(_) => DatasetKind::Grid2D,
            Dataset::Expression(_) => DatasetKind::Expression,
        }
    }

    pub fn linked(&self) -> Option<&Rc<Linkage>> {
        match self {
            Dataset::Literal(ds) => ds.linked.as_ref(),
            Dataset::Grid2D(ds) => ds.linked.as_ref(),
            Dataset::Expression(_) => None,
        }
    }

    /// Set or clear the file link. Expression datasets cannot be linked.
    pub fn set_linked(&mut self, link: Option<Rc<Linkage>>) {
        match self {
            Dataset::Literal(ds) => ds.linked = link,
            Dataset::Grid2D(ds) => ds.linked = link,
            Dataset::Expression(_) => {}
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralDataset> {
        match self {
            Dataset::Literal(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn as_grid(&self) -> Option<&Grid2DDataset> {
        match self {
            Dataset::Grid2D(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&ExpressionDataset> {
        match self {
            Dataset::Expression(ds) => Some(ds),
            _ => None,
        }
    }
}

impl From<LiteralDataset> for Dataset {
    fn from(ds: LiteralDataset) -> Self {
        Dataset::Literal(ds)
    }
}

impl From<Grid2DDataset> for Dataset {
    fn from(ds: Grid2DDataset) -> Self {
        Dataset::Grid2D(ds)
    }
}

impl From<ExpressionDataset> for Dataset {
    fn from(ds: ExpressionDataset) -> Self {
        Dataset::Expression(ds)
    }
}
