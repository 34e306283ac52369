// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Only the global flags are declared here. A command's own `--arg VALUE`
//! options depend on the loaded rfile, so they are captured verbatim in
//! [`CliArgs::args`] and parsed later by [`crate::select::parse_task_args`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `r`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "r",
    version,
    about = "A simple command runner for executing Python and shell scripts.",
    long_about = None,
    disable_help_flag = true
)]
pub struct CliArgs {
    /// The YAML rfile to use ('rfile' in the current directory or a parent by default).
    #[arg(short = 'r', long, value_name = "RFILE")]
    pub rfile: Option<PathBuf>,

    /// Verbose output for debugging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Show help for rfile or for the selected command.
    #[arg(short, long)]
    pub help: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--verbose`, then `RFILE_LOG`, then `warn` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Maximum number of parallel dependencies in flight.
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Run the selected command once even if it declares `# watch`.
    #[arg(long)]
    pub no_watch: bool,

    /// Watch these paths instead of the command's own watch target.
    #[arg(short = 'w', long = "watch", value_name = "PATH")]
    pub watch: Vec<PathBuf>,

    /// (dev) Print shell completions.
    #[arg(long)]
    pub completions: bool,

    /// (dev) Previous shell words, used with `--completions`.
    #[arg(long, value_name = "WORDS")]
    pub prev: Option<String>,

    /// Command to run (the first command in the rfile by default).
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Arguments for the command, e.g. `--name value`.
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
