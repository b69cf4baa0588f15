// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `proc-interact`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "proc-interact",
    version,
    about = "Run a command and answer its prompts according to a TOML interaction file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the interaction config file (TOML).
    ///
    /// Without a config the command runs with no replies and every line of
    /// its output is echoed.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Spawn the process and poll it using `[schedule]` instead of waiting
    /// for it directly. The process is terminated when the timeout expires
    /// or once the interaction marks it finished.
    #[arg(long)]
    pub spawn: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROC_INTERACT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Program to run, followed by its arguments.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
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
