use std::path::PathBuf;

use plotdoc_expr::ExprError;
use plotdoc_ingest::IngestError;
use plotdoc_model::{DatasetExpressionError, DatasetKind, ModelError};
use thiserror::Error;

use crate::export::ExportError;
use crate::script::ScriptError;
use crate::tree::WidgetId;

/// Failure to resolve a `/`-separated widget path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("the root widget has no parent")]
    NoParent,
    #[error("child '{name}' does not exist")]
    ChildNotFound { name: String },
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("no dataset named '{0}'")]
    DatasetNotFound(String),
    #[error("'{name}' already exists")]
    NameCollision { name: String },
    #[error("dataset '{name}' is {found}, expected {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: DatasetKind,
    },
    #[error(transparent)]
    Expression(#[from] DatasetExpressionError),
    #[error(transparent)]
    Formula(#[from] ExprError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("no setting '{path}'")]
    SettingNotFound { path: String },
    #[error("setting '{path}' expects {expected}, got {found}")]
    SettingType {
        path: String,
        expected: &'static str,
        found: String,
    },
    #[error("cannot add a {child} widget to a {parent} widget")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },
    #[error("unknown widget type '{0}'")]
    UnknownWidgetType(String),
    #[error("'{0}' is not a valid widget name")]
    InvalidWidgetName(String),
    #[error("widget {0} does not exist")]
    WidgetNotFound(WidgetId),
    #[error("the root widget cannot be removed")]
    RemoveRoot,
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write document: {0}")]
    Write(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

impl DocumentError {
    pub fn collision(name: impl Into<String>) -> Self {
        Self::NameCollision { name: name.into() }
    }

    pub fn setting_not_found(path: impl ToString) -> Self {
        Self::SettingNotFound {
            path: path.to_string(),
        }
    }

    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
