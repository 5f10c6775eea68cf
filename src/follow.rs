// src/follow.rs

//! Driving an asynchronous process to completion from a Tokio task.
//!
//! [`follow`] is the polling loop the CLI uses for `procpipe start`: it
//! repeatedly pulls output from a [`ProcessControl`] into writers, and
//! kills the process when a timeout elapses or a cancel future resolves
//! (Ctrl-C in production).
//!
//! The loop talks to a trait instead of [`AsyncProcess`] directly so tests
//! can drive it with a scripted fake that never spawns anything.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::{debug, info, warn};

use crate::exec::{AsyncProcess, DEFAULT_POLL_INTERVAL};
use crate::types::ExitState;

/// The subset of [`AsyncProcess`] the follow loop needs.
pub trait ProcessControl: Send {
    fn pid(&self) -> u32;
    fn is_running(&mut self) -> bool;
    fn read_output(&mut self) -> Option<Vec<u8>>;

    /// Separately captured stderr, if any.
    fn read_error_output(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn output_eof(&self) -> bool;
    fn kill(&mut self) -> bool;
    fn exit_state(&mut self) -> ExitState;
}

impl ProcessControl for AsyncProcess {
    fn pid(&self) -> u32 {
        AsyncProcess::pid(self)
    }

    fn is_running(&mut self) -> bool {
        AsyncProcess::is_running(self)
    }

    fn read_output(&mut self) -> Option<Vec<u8>> {
        AsyncProcess::read_output(self)
    }

    fn read_error_output(&mut self) -> Option<Vec<u8>> {
        AsyncProcess::read_error_output(self)
    }

    fn output_eof(&self) -> bool {
        AsyncProcess::output_eof(self)
    }

    fn kill(&mut self) -> bool {
        AsyncProcess::kill(self)
    }

    fn exit_state(&mut self) -> ExitState {
        AsyncProcess::exit_state(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FollowOptions {
    pub poll_interval: Duration,
    /// Kill the process once this much time has passed.
    pub timeout: Option<Duration>,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowOutcome {
    pub exit: ExitState,
    pub timed_out: bool,
    pub cancelled: bool,
    /// Total bytes forwarded to both writers.
    pub bytes: usize,
}

/// Poll `process` until it has exited and its output is drained.
///
/// Output is forwarded to `stdout` / `stderr` as it arrives. When the
/// timeout elapses or `cancel` resolves the process is killed, and the
/// loop keeps draining until the kill has taken effect.
pub async fn follow<P, O, E, C>(
    process: &mut P,
    stdout: &mut O,
    stderr: &mut E,
    options: FollowOptions,
    cancel: C,
) -> Result<FollowOutcome>
where
    P: ProcessControl + ?Sized,
    O: Write,
    E: Write,
    C: Future<Output = ()>,
{
    let pid = process.pid();
    let deadline = options.timeout.map(|t| Instant::now() + t);

    let mut ticker = interval(options.poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(cancel);

    let mut outcome = FollowOutcome {
        exit: ExitState::Running,
        timed_out: false,
        cancelled: false,
        bytes: 0,
    };

    loop {
        let stopping = outcome.timed_out || outcome.cancelled;

        tokio::select! {
            _ = ticker.tick() => {}

            _ = &mut cancel, if !stopping => {
                info!(pid, "cancellation requested; killing process");
                outcome.cancelled = true;
                if !process.kill() {
                    warn!(pid, "failed to kill process on cancellation");
                }
            }

            _ = wait_deadline(deadline), if !stopping && deadline.is_some() => {
                info!(pid, timeout = ?options.timeout, "timeout elapsed; killing process");
                outcome.timed_out = true;
                if !process.kill() {
                    warn!(pid, "failed to kill process on timeout");
                }
            }
        }

        outcome.bytes += pump(process, stdout, stderr)?;

        if !process.is_running() {
            // Whatever the child wrote before exiting is already in the
            // pipe; drain it and stop. A grandchild holding the pipe open
            // must not keep us here.
            while !process.output_eof() {
                let n = pump(process, stdout, stderr)?;
                if n == 0 {
                    break;
                }
                outcome.bytes += n;
            }
            break;
        }
    }

    outcome.exit = process.exit_state();
    debug!(pid, exit = %outcome.exit, bytes = outcome.bytes, "follow finished");
    Ok(outcome)
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Forward whatever output is available right now. Returns bytes written.
fn pump<P, O, E>(process: &mut P, stdout: &mut O, stderr: &mut E) -> Result<usize>
where
    P: ProcessControl + ?Sized,
    O: Write,
    E: Write,
{
    let mut written = 0;

    if let Some(bytes) = process.read_output() {
        stdout
            .write_all(&bytes)
            .and_then(|()| stdout.flush())
            .context("writing process output")?;
        written += bytes.len();
    }

    if let Some(bytes) = process.read_error_output() {
        stderr
            .write_all(&bytes)
            .and_then(|()| stderr.flush())
            .context("writing process error output")?;
        written += bytes.len();
    }

    Ok(written)
}
