//! Library side of the `plotdoc` command-line tool.

pub mod commands;
pub mod logging;
pub mod types;
