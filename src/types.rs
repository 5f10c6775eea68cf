// src/types.rs

use std::fmt;

/// Sentinel returned by the compatibility exit-code accessors when no real
/// exit code is available (still running, never started, or closed).
pub const EXIT_CODE_UNAVAILABLE: i32 = -1;

/// How a child's standard error is captured.
///
/// - `Merged`: stderr is written into the same pipe as stdout, so the
///   caller sees one interleaved stream (default).
/// - `Separate`: stderr gets its own pipe and is reported on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Merged,
    Separate,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Merged
    }
}

/// Where an asynchronously started process is in its life.
///
/// This is the unambiguous counterpart of the `-1` sentinel used by
/// [`AsyncProcess::exit_code`](crate::exec::AsyncProcess::exit_code):
/// a process that really exited with `-1` is `Exited(-1)`, never `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    /// Start failed, or the handle has been closed.
    NotStarted,
    Running,
    Exited(i32),
    /// The OS could not report the status (for instance, the child was
    /// reaped behind the handle's back). Not running, exit code unknown.
    Unknown,
}

impl ExitState {
    pub fn code(self) -> Option<i32> {
        match self {
            ExitState::Exited(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitState::NotStarted => write!(f, "not started"),
            ExitState::Running => write!(f, "running"),
            ExitState::Exited(code) => write!(f, "exited with code {code}"),
            ExitState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of a bounded wait on a running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The process has exited.
    Finished,
    /// The wait duration elapsed first; the process is still running.
    TimedOut,
    /// The handle is unusable or the OS refused the query.
    Error,
}
