// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command_line`] splits a command string into program and arguments
//!   (no shell involved).
//! - [`launch`] creates the output pipe(s) and starts the child.
//! - [`pipe`] holds the non-blocking read and `poll(2)` helpers.
//! - [`buffer`] is the bounded, doubling output buffer.
//! - [`execute`] is the blocking executor returning an [`ExecutionResult`].
//! - [`async_process`] is the caller-polled [`AsyncProcess`] handle.
//!
//! [`Executor`] carries the size and timing limits both modes share; the
//! free functions at the bottom use the defaults.

pub mod async_process;
pub mod buffer;
pub mod command_line;
pub mod execute;
pub mod launch;
pub mod pipe;

use std::time::Duration;

pub use async_process::AsyncProcess;
pub use buffer::{BufferPolicy, OutputBuffer};
pub use command_line::{CommandLine, join_program_args};
pub use execute::ExecutionResult;
pub use launch::{LaunchOptions, exit_code_of};

/// Default interval between status checks in [`AsyncProcess::wait_timeout`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Size and timing limits shared by both execution modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecLimits {
    /// Growth policy and ceiling for captured output.
    pub buffer: BufferPolicy,
    /// Bytes requested from the pipe per read.
    pub chunk_size: usize,
    /// Most bytes a single [`AsyncProcess::read_output`] call returns.
    pub async_max_read: usize,
    pub poll_interval: Duration,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            buffer: BufferPolicy::default(),
            chunk_size: buffer::DEFAULT_INITIAL_CAPACITY,
            async_max_read: buffer::DEFAULT_MAX_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Entry point for running commands with a given set of limits.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    limits: ExecLimits,
}

impl Executor {
    pub fn new(limits: ExecLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ExecLimits {
        &self.limits
    }
}

fn options_for(working_dir: &str, show_window: bool) -> LaunchOptions {
    LaunchOptions::new()
        .working_dir(working_dir)
        .show_window(show_window)
}

/// Run `command` to completion with default limits and merged output.
/// An empty `working_dir` runs in the current directory.
pub fn execute(command: &str, working_dir: &str, show_window: bool) -> ExecutionResult {
    Executor::default().execute(command, &options_for(working_dir, show_window))
}

/// Like [`execute`], with the command line built as `"program args"`.
pub fn execute_with_args(
    program: &str,
    args: &str,
    working_dir: &str,
    show_window: bool,
) -> ExecutionResult {
    Executor::default().execute_with_args(program, args, &options_for(working_dir, show_window))
}

/// Start `command` without waiting, with default limits and merged output.
pub fn start_async(command: &str, working_dir: &str, show_window: bool) -> AsyncProcess {
    Executor::default().start(command, &options_for(working_dir, show_window))
}
