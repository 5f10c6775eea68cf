// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `procpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procpipe",
    version,
    about = "Run a command and capture its output, blocking or by polling.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// If omitted, `PROCPIPE_CONFIG` or `./procpipe.toml` is used when
    /// present; otherwise built-in defaults apply.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCPIPE_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a command to completion and print everything it wrote.
    Exec {
        /// Command line, split without a shell (quote with "...").
        command: String,

        /// Extra arguments appended to the command after one space.
        #[arg(long, value_name = "ARGS", default_value = "")]
        args: String,

        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Start a command and stream its output while polling it.
    Start {
        /// Command line, split without a shell (quote with "...").
        command: String,

        /// Kill the process after this many milliseconds.
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Poll interval in milliseconds (overrides `[wait].poll_interval_ms`).
        #[arg(long, value_name = "MS")]
        poll_ms: Option<u64>,

        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Report whether an executable can be found through PATH.
    Which {
        name: String,
    },
}

/// Options shared by `exec` and `start`.
#[derive(Debug, Clone, clap::Args)]
pub struct LaunchArgs {
    /// Working directory for the child (default: current directory).
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Keep the child in this terminal's process group.
    #[arg(long)]
    pub show_window: bool,

    /// Capture stderr separately instead of merging it into stdout.
    #[arg(long)]
    pub separate_stderr: bool,
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
