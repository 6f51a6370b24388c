//! CLI argument definitions for plotdoc.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "plotdoc",
    version,
    about = "Inspect, reload and re-save plotdoc documents",
    long_about = "Inspect, reload and re-save plotdoc documents.\n\n\
                  A document is a script of import, data and widget statements.\n\
                  Linked datasets are re-read from their files on reload."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the datasets of a document.
    Datasets(DatasetsArgs),

    /// Show the widget tree of a document.
    Tree(TreeArgs),

    /// Print the values of one dataset.
    Get(GetArgs),

    /// Re-read linked files and save the refreshed document.
    Reload(ReloadArgs),

    /// Load a document and save it again.
    Resave(ResaveArgs),
}

#[derive(Args)]
pub struct DatasetsArgs {
    /// Saved document to read.
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    /// Widget to start from, e.g. `/page1/graph1`.
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub path: String,
}

#[derive(Args)]
pub struct GetArgs {
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    /// Dataset name.
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ReloadArgs {
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    /// Where to save the refreshed document (default: overwrite DOC).
    #[arg(long, value_name = "OUT")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub save: SaveArgs,
}

#[derive(Args)]
pub struct ResaveArgs {
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    #[arg(value_name = "OUT")]
    pub output: PathBuf,

    #[command(flatten)]
    pub save: SaveArgs,
}

/// Header options for saved documents.
#[derive(Args)]
pub struct SaveArgs {
    /// Leave the date out of the saved header.
    #[arg(long = "no-date")]
    pub no_date: bool,

    /// Leave the user name out of the saved header.
    #[arg(long = "no-user")]
    pub no_user: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
