// src/logging.rs

//! Logging setup for `procpipe` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level`: applies to `procpipe`'s own events, everything else
//!    stays at `warn`;
//! 2. `PROCPIPE_LOG`: any `EnvFilter` directive string, e.g. `debug` or
//!    `warn,procpipe::exec=trace`;
//! 3. `warn`.
//!
//! Logs go to STDERR; STDOUT carries nothing but the child's output.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "PROCPIPE_LOG";

const DEFAULT_DIRECTIVES: &str = "warn";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let directives = filter_directives(cli_level, env.as_deref());

    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("procpipe: ignoring invalid {LOG_ENV_VAR} '{directives}': {e}");
        EnvFilter::new(DEFAULT_DIRECTIVES)
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("initialising logging: {e}"))?;

    Ok(())
}

/// Directive string for the given CLI level and `PROCPIPE_LOG` value.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    let env = env.map(str::trim).filter(|s| !s.is_empty());
    match (cli_level, env) {
        (Some(level), _) => format!("{DEFAULT_DIRECTIVES},procpipe={}", level_name(level)),
        (None, Some(directives)) => directives.to_string(),
        (None, None) => DEFAULT_DIRECTIVES.to_string(),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
