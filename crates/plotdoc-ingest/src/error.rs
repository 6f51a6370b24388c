use std::path::PathBuf;

use plotdoc_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid descriptor '{descriptor}': {message}")]
    Descriptor { descriptor: String, message: String },
    #[error("cannot read 2D dataset '{name}'{}: {message}", line_suffix(*.line))]
    Grid {
        name: String,
        line: Option<usize>,
        message: String,
    },
    #[error("FITS support is not available; register a FITS source to import FITS files")]
    FitsUnavailable,
    #[error("cannot read HDU {hdu}: {message}")]
    FitsHdu { hdu: String, message: String },
    #[error("FITS column '{column}': {message}")]
    FitsColumn { column: String, message: String },
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, IngestError>;

fn line_suffix(line: Option<usize>) -> String {
    line.map(|line| format!(" (line {line})")).unwrap_or_default()
}

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn descriptor(descriptor: &str, message: impl Into<String>) -> Self {
        Self::Descriptor {
            descriptor: descriptor.to_string(),
            message: message.into(),
        }
    }

    pub fn grid(name: &str, line: Option<usize>, message: impl Into<String>) -> Self {
        Self::Grid {
            name: name.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn fits_column(column: &str, message: impl Into<String>) -> Self {
        Self::FitsColumn {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_message_includes_line() {
        let err = IngestError::grid("img", Some(4), "ragged row");
        assert_eq!(err.to_string(), "cannot read 2D dataset 'img' (line 4): ragged row");
        let err = IngestError::grid("img", None, "no data");
        assert_eq!(err.to_string(), "cannot read 2D dataset 'img': no data");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = IngestError::io(
            "data/missing.dat",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("data/missing.dat"));
    }
}
