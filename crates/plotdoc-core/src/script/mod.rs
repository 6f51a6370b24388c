//! Loading saved documents.
//!
//! A saved document is a list of calls such as
//! `ImportString('x,+-','''...''')` or `Set('label', 'time')`. Loading parses
//! the whole script first and then replays it against an empty document
//! through a [`CommandInterface`], so a syntax error never leaves a
//! half-built document behind.

mod interpreter;
mod lexer;
mod parser;

use std::path::Path;

use thiserror::Error;
use tracing::info;

pub use parser::{Call, Literal, parse};

use crate::command::CommandInterface;
use crate::document::Document;
use crate::error::{DocumentError, Result};
use crate::options::LoadOptions;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: {command}: {message}")]
    Argument {
        line: usize,
        command: String,
        message: String,
    },
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: {command} failed: {source}")]
    Command {
        line: usize,
        command: String,
        #[source]
        source: Box<DocumentError>,
    },
}

impl ScriptError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Line of the statement that failed.
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Syntax { line, .. }
            | ScriptError::Argument { line, .. }
            | ScriptError::UnknownCommand { line, .. }
            | ScriptError::Command { line, .. } => *line,
        }
    }
}

impl Document {
    /// Build a document by running a saved script.
    pub fn load_script(text: &str, options: &LoadOptions) -> Result<Document> {
        let calls = parse(text)?;
        let mut document = Document::new();
        if let Some(source) = &options.fits_source {
            document.set_fits_source(Some(source.clone()));
        }
        let mut interface = CommandInterface::new(document);
        interpreter::run(&mut interface, &calls, options)?;
        let mut document = interface.into_document();
        document.set_modified(false);
        info!(
            statements = calls.len(),
            datasets = document.datasets.len(),
            "loaded document"
        );
        Ok(document)
    }

    /// Load a saved document from disk. Relative file names inside it are
    /// resolved against the file's directory unless `options` names one.
    pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Document> {
        let text =
            std::fs::read_to_string(path).map_err(|err| DocumentError::io("read", path, err))?;
        let mut options = options.clone();
        if options.base_dir.is_none()
            && let Some(dir) = path.parent()
        {
            options.base_dir = Some(dir.to_path_buf());
        }
        Document::load_script(&text, &options)
    }
}
