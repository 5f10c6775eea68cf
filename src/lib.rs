// src/lib.rs

//! Launch external commands and capture their output.
//!
//! Two ways to run a command:
//!
//! - [`execute`] blocks until the child has exited and returns an
//!   [`ExecutionResult`] with the captured output (stdout and stderr merged
//!   by default) and the exit code.
//! - [`start_async`] returns an [`AsyncProcess`] right away; the caller
//!   polls it for liveness and new output, waits with a timeout, or kills it.
//!
//! Neither mode spawns threads or background tasks. Command strings are
//! split into program and arguments without involving a shell.

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod follow;
pub mod logging;
pub mod path_lookup;
pub mod types;

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use crate::exec::{
    AsyncProcess, ExecLimits, ExecutionResult, Executor, LaunchOptions, execute,
    execute_with_args, start_async,
};
pub use crate::path_lookup::exists_in_path;
pub use crate::types::{ExitState, OutputMode, WaitOutcome};

use crate::cli::{CliArgs, Command, LaunchArgs};
use crate::config::{ConfigFile, load_or_default};
use crate::follow::{FollowOptions, follow};

/// Exit status the CLI uses when the command could not be started.
pub const EXIT_NOT_STARTED: i32 = 127;

/// High-level entry point used by `main.rs`. Returns the exit status the
/// binary should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_or_default(args.config.as_deref()).context("loading config")?;
    let executor = Executor::new(cfg.exec_limits());

    match args.command {
        Command::Exec {
            command,
            args: extra,
            launch,
        } => {
            let options = launch_options(&cfg, &launch);
            // The blocking executor must not stall the runtime's workers.
            let result = tokio::task::spawn_blocking(move || {
                executor.execute_with_args(&command, &extra, &options)
            })
            .await
            .context("joining blocking execute")?;
            report_execution(&result)
        }

        Command::Start {
            command,
            timeout_ms,
            poll_ms,
            launch,
        } => {
            let options = launch_options(&cfg, &launch);
            let mut process = executor.start(&command, &options);
            if !process.started() {
                eprintln!(
                    "procpipe: {}",
                    process.error().unwrap_or("failed to start process")
                );
                return Ok(EXIT_NOT_STARTED);
            }

            let follow_options = FollowOptions {
                poll_interval: poll_ms
                    .map(Duration::from_millis)
                    .unwrap_or(executor.limits().poll_interval),
                timeout: timeout_ms.map(Duration::from_millis),
            };

            let outcome = follow(
                &mut process,
                &mut std::io::stdout(),
                &mut std::io::stderr(),
                follow_options,
                ctrl_c(),
            )
            .await?;
            process.close();

            info!(
                exit = %outcome.exit,
                timed_out = outcome.timed_out,
                cancelled = outcome.cancelled,
                bytes = outcome.bytes,
                "process followed to completion"
            );
            Ok(outcome.exit.code().unwrap_or(1))
        }

        Command::Which { name } => {
            let found = exists_in_path(&name);
            println!("{name}: {}", if found { "found" } else { "not found" });
            Ok(if found { 0 } else { 1 })
        }
    }
}

fn launch_options(cfg: &ConfigFile, launch: &LaunchArgs) -> LaunchOptions {
    let mut options = cfg.launch_defaults();
    if let Some(dir) = &launch.cwd {
        options = options.working_dir(dir);
    }
    if launch.show_window {
        options = options.show_window(true);
    }
    if launch.separate_stderr {
        options = options.output_mode(OutputMode::Separate);
    }
    options
}

fn report_execution(result: &ExecutionResult) -> Result<i32> {
    if !result.success() {
        eprintln!(
            "procpipe: {}",
            result.error().unwrap_or("failed to start process")
        );
        return Ok(EXIT_NOT_STARTED);
    }
    if let Some(warning) = result.error() {
        warn!(warning, "command finished with warnings");
    }
    if result.truncated() {
        warn!(bytes = result.output().len(), "output truncated at ceiling");
    }

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(result.output())
        .and_then(|()| stdout.flush())
        .context("writing captured output")?;
    if let Some(stderr) = result.stderr() {
        let mut err = std::io::stderr().lock();
        err.write_all(stderr)
            .and_then(|()| err.flush())
            .context("writing captured error output")?;
    }

    Ok(result.exit_code())
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed this never
/// resolves, so following simply runs without cancellation.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
