//! plotdoc command-line tool.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use plotdoc_cli::commands;
use plotdoc_cli::logging::{LogConfig, LogFormat, init_logging};
use plotdoc_core::SaveOptions;
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, SaveArgs};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> anyhow::Result<i32> {
    match command {
        Command::Datasets(args) => {
            let summaries = commands::datasets(&args.document)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                summary::print_datasets(&summaries);
            }
            Ok(0)
        }
        Command::Tree(args) => {
            let entries = commands::tree(&args.document, &args.path)?;
            summary::print_tree(&entries);
            Ok(0)
        }
        Command::Get(args) => {
            let dump = commands::get(&args.document, &args.name)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&dump)?);
            } else {
                summary::print_dataset(&args.name, &dump);
            }
            Ok(0)
        }
        Command::Reload(args) => {
            let result = commands::reload(
                &args.document,
                args.output.as_deref(),
                &save_options(&args.save),
            )?;
            summary::print_reload(&result);
            Ok(if result.summary.has_errors() { 1 } else { 0 })
        }
        Command::Resave(args) => {
            commands::resave(&args.document, &args.output, &save_options(&args.save))?;
            Ok(0)
        }
    }
}

fn save_options(args: &SaveArgs) -> SaveOptions {
    let mut options = SaveOptions::new().with_date(!args.no_date);
    if args.no_user {
        options = options.with_user(None);
    }
    options
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
