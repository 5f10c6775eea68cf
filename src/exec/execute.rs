// src/exec/execute.rs

//! Blocking execution: start, drain output to end-of-stream, wait, report.

use std::borrow::Cow;

use tracing::{debug, info, warn};

use super::buffer::OutputBuffer;
use super::command_line::{CommandLine, join_program_args};
use super::launch::{LaunchOptions, Launched, exit_code_of, launch};
use super::pipe::{CaptureStream, drain_to_eof};
use super::Executor;
use crate::errors::describe_os_error;
use crate::types::EXIT_CODE_UNAVAILABLE;

/// Outcome of a blocking [`Executor::execute`] call.
///
/// `success` tells whether the process could be created at all. A process
/// that ran and exited non-zero is still a success with that exit code.
/// `error` is set when `success` is false, or alongside a successful run
/// when something non-fatal happened (a read error mid-stream, a failed
/// wait, an allocation failure while growing the buffer).
///
/// Output beyond the configured ceiling is dropped; [`truncated`] reports
/// that it happened but it never counts as an error.
///
/// [`truncated`]: ExecutionResult::truncated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    exit_code: i32,
    success: bool,
    output: Vec<u8>,
    stderr: Option<Vec<u8>>,
    error: Option<String>,
    truncated: bool,
}

impl ExecutionResult {
    fn failed(message: String) -> Self {
        Self {
            exit_code: EXIT_CODE_UNAVAILABLE,
            success: false,
            output: Vec::new(),
            stderr: None,
            error: Some(message),
            truncated: false,
        }
    }

    /// Exit code of the process; `-1` when it could not be started.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Captured output. With merged output this holds stdout and stderr
    /// interleaved as the child wrote them.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    /// Separately captured stderr; `None` with merged output.
    pub fn stderr(&self) -> Option<&[u8]> {
        self.stderr.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
}

impl Executor {
    /// Run `command` to completion and capture its output.
    ///
    /// Blocks the calling thread until the child has closed its output and
    /// exited. Never panics and never returns an error: every failure is
    /// reported inside the [`ExecutionResult`].
    pub fn execute(&self, command: &str, options: &LaunchOptions) -> ExecutionResult {
        let command_line = match CommandLine::parse(command) {
            Ok(cl) => cl,
            Err(err) => {
                warn!(command, error = %err, "rejected command line");
                return ExecutionResult::failed(err.to_string());
            }
        };

        let Launched {
            mut child,
            stdout,
            stderr,
        } = match launch(&command_line, options) {
            Ok(launched) => launched,
            Err(err) => {
                warn!(command, error = %err, "failed to start process");
                return ExecutionResult::failed(err.to_string());
            }
        };
        let pid = child.id();

        let policy = self.limits.buffer;
        let mut streams = vec![CaptureStream::new(
            "stdout",
            stdout,
            OutputBuffer::new(policy),
        )];
        if let Some(stderr) = stderr {
            streams.push(CaptureStream::new(
                "stderr",
                stderr,
                OutputBuffer::new(policy),
            ));
        }

        drain_to_eof(&mut streams, self.limits.chunk_size);
        debug!(pid, "output drained; waiting for exit");

        let mut warnings = Vec::new();
        let exit_code = match child.wait() {
            Ok(status) => exit_code_of(status),
            Err(err) => {
                warnings.push(format!("waiting for process: {}", describe_os_error(&err)));
                EXIT_CODE_UNAVAILABLE
            }
        };

        let mut captured = streams.into_iter().map(CaptureStream::into_parts);
        let mut truncated = false;
        let mut collect = |(buffer, warning): (OutputBuffer, Option<String>)| {
            truncated |= buffer.truncated();
            if buffer.exhausted() {
                warnings.push("memory allocation failed; output is incomplete".to_string());
            }
            warnings.extend(warning);
            buffer.into_bytes()
        };

        let output = captured.next().map(&mut collect).unwrap_or_default();
        let stderr = captured.next().map(&mut collect);

        info!(
            pid,
            exit_code,
            bytes = output.len(),
            truncated,
            "process finished"
        );

        ExecutionResult {
            exit_code,
            success: true,
            output,
            stderr,
            error: (!warnings.is_empty()).then(|| warnings.join("; ")),
            truncated,
        }
    }

    /// [`execute`](Self::execute) with the command line built from a
    /// program name and an argument string joined by one space.
    pub fn execute_with_args(
        &self,
        program: &str,
        args: &str,
        options: &LaunchOptions,
    ) -> ExecutionResult {
        self.execute(&join_program_args(program, args), options)
    }
}
