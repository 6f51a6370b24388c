use thiserror::Error;

use crate::columns::DatasetPart;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{part} has {actual} values but the dataset has {expected}")]
    LengthMismatch {
        part: DatasetPart,
        expected: usize,
        actual: usize,
    },
    #[error("the values of a dataset cannot be removed")]
    MissingValues,
    #[error("unknown dataset part '{0}' (expected data, serr, nerr or perr)")]
    UnknownPart(String),
    #[error("grid row {row} has {actual} columns, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("grid has no values")]
    EmptyGrid,
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Failure to compute a formula-derived dataset.
///
/// Raised lazily when the dataset is read, and cached alongside successful
/// results until the document changes again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetExpressionError {
    #[error("error evaluating expression '{expression}': {cause}")]
    Evaluation { expression: String, cause: String },
    #[error("expressions for dataset parts do not yield results of the same length ({})", format_lengths(.lengths))]
    InconsistentLength { lengths: Vec<(DatasetPart, usize)> },
    #[error("dataset '{dataset}' refers to itself through its expressions")]
    Circular { dataset: String },
}

impl DatasetExpressionError {
    pub fn evaluation(expression: impl Into<String>, cause: impl ToString) -> Self {
        Self::Evaluation {
            expression: expression.into(),
            cause: cause.to_string(),
        }
    }

    pub fn circular(dataset: impl Into<String>) -> Self {
        Self::Circular {
            dataset: dataset.into(),
        }
    }
}

fn format_lengths(lengths: &[(DatasetPart, usize)]) -> String {
    lengths
        .iter()
        .map(|(part, len)| format!("{part}={len}"))
        .collect::<Vec<_>>()
        .join(", ")
}
