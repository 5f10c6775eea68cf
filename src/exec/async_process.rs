// src/exec/async_process.rs

//! Caller-driven asynchronous execution.
//!
//! [`AsyncProcess`] starts a child and hands control straight back. Nothing
//! runs in the background: the caller polls [`is_running`], pulls whatever
//! output is buffered with [`read_output`], and may block for a bounded time
//! with [`wait_timeout`].
//!
//! The handle exclusively owns the child and the read end(s) of its output
//! pipe(s) until [`close`] (or drop) releases them. Each resource is an
//! `Option` that is taken on release, so nothing is ever released twice.
//! After `close`, every query answers with its "unavailable" value.
//!
//! [`is_running`]: AsyncProcess::is_running
//! [`read_output`]: AsyncProcess::read_output
//! [`wait_timeout`]: AsyncProcess::wait_timeout
//! [`close`]: AsyncProcess::close

use std::io::PipeReader;
use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::buffer::{BufferPolicy, OutputBuffer};
use super::command_line::CommandLine;
use super::launch::{LaunchOptions, Launched, exit_code_of, launch};
use super::pipe::{ReadStep, is_readable, read_chunk, set_nonblocking};
use super::{ExecLimits, Executor};
use crate::errors::{ProcessError, describe_os_error};
use crate::types::{EXIT_CODE_UNAVAILABLE, ExitState, WaitOutcome};

/// Read side of one output pipe of a running child.
#[derive(Debug)]
struct OutputPipe {
    reader: Option<PipeReader>,
    eof: bool,
}

impl OutputPipe {
    fn new(reader: PipeReader) -> Self {
        Self {
            reader: Some(reader),
            eof: false,
        }
    }

    fn close(&mut self) -> bool {
        self.reader.take().is_some()
    }

    /// Drain what is buffered right now, up to `policy.max_size` bytes.
    ///
    /// Returns `None` when nothing is buffered (the child may still write
    /// more later) or the stream already ended.
    fn read_available(&mut self, policy: BufferPolicy, chunk_size: usize) -> Option<Vec<u8>> {
        if self.eof {
            return None;
        }
        let reader = self.reader.as_mut()?;

        match is_readable(reader) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                warn!(error = %describe_os_error(&err), "polling output pipe failed");
                return None;
            }
        }

        let mut buffer = OutputBuffer::new(policy);
        let mut chunk = vec![0u8; chunk_size.max(1)];

        while !buffer.is_full() {
            // Never read more than fits: anything left stays in the pipe
            // for the next call instead of being dropped.
            let want = chunk.len().min(buffer.headroom());
            match read_chunk(reader, &mut chunk[..want]) {
                Ok(ReadStep::Data(n)) => {
                    buffer.push(&chunk[..n]);
                }
                Ok(ReadStep::WouldBlock) => break,
                Ok(ReadStep::Eof) => {
                    trace!("output pipe reached end-of-stream");
                    self.eof = true;
                    break;
                }
                Err(err) => {
                    warn!(error = %describe_os_error(&err), "reading output pipe failed");
                    break;
                }
            }
        }

        if buffer.is_empty() {
            None
        } else {
            Some(buffer.into_bytes())
        }
    }
}

/// Handle to a process started with [`Executor::start`].
#[derive(Debug)]
pub struct AsyncProcess {
    started: bool,
    closed: bool,
    pid: u32,
    child: Option<Child>,
    stdout: Option<OutputPipe>,
    stderr: Option<OutputPipe>,
    exit_code: Option<i32>,
    /// SIGKILL was delivered; `close` may block briefly to reap.
    kill_sent: bool,
    error: Option<String>,
    limits: ExecLimits,
}

impl AsyncProcess {
    fn failed(err: ProcessError, limits: ExecLimits) -> Self {
        Self {
            started: false,
            closed: false,
            pid: 0,
            child: None,
            stdout: None,
            stderr: None,
            exit_code: None,
            kill_sent: false,
            error: Some(err.to_string()),
            limits,
        }
    }

    fn start(command: &str, options: &LaunchOptions, limits: ExecLimits) -> Self {
        let command_line = match CommandLine::parse(command) {
            Ok(cl) => cl,
            Err(err) => {
                warn!(command, error = %err, "rejected command line");
                return Self::failed(err, limits);
            }
        };

        let Launched {
            child,
            stdout,
            stderr,
        } = match launch(&command_line, options) {
            Ok(launched) => launched,
            Err(err) => {
                warn!(command, error = %err, "failed to start process");
                return Self::failed(err, limits);
            }
        };

        let nonblocking = set_nonblocking(&stdout).and_then(|()| match &stderr {
            Some(reader) => set_nonblocking(reader),
            None => Ok(()),
        });
        if let Err(err) = nonblocking {
            // Blocking reads would break the polling contract. The child is
            // already running, so stop it before giving up.
            let mut child = child;
            let _ = child.kill();
            let _ = child.wait();
            warn!(command, error = %describe_os_error(&err), "could not make output pipe non-blocking");
            return Self::failed(ProcessError::Io(err), limits);
        }

        let pid = child.id();
        info!(pid, command, "started asynchronous process");

        Self {
            started: true,
            closed: false,
            pid,
            child: Some(child),
            stdout: Some(OutputPipe::new(stdout)),
            stderr: stderr.map(OutputPipe::new),
            exit_code: None,
            kill_sent: false,
            error: None,
            limits,
        }
    }

    /// Whether the process was created successfully.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Why starting failed, if it did.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Refresh the cached exit code without blocking.
    fn poll_exit(&mut self) -> Option<ExitState> {
        if self.closed {
            return None;
        }
        if let Some(code) = self.exit_code {
            return Some(ExitState::Exited(code));
        }
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                let code = exit_code_of(status);
                debug!(pid = self.pid, exit_code = code, "process exited");
                self.exit_code = Some(code);
                Some(ExitState::Exited(code))
            }
            Ok(None) => Some(ExitState::Running),
            Err(err) => {
                warn!(pid = self.pid, error = %describe_os_error(&err), "querying process status failed");
                Some(ExitState::Unknown)
            }
        }
    }

    /// Non-blocking liveness check. `false` for a handle that never started,
    /// has been closed, or whose status can no longer be queried.
    pub fn is_running(&mut self) -> bool {
        matches!(self.poll_exit(), Some(ExitState::Running))
    }

    /// OS process id captured at start, or `0` if the process never started
    /// or the handle has been closed.
    pub fn pid(&self) -> u32 {
        if self.started && !self.closed {
            self.pid
        } else {
            0
        }
    }

    /// Block for at most `timeout` waiting for the process to exit.
    ///
    /// The wait polls the child's status every
    /// [`ExecLimits::poll_interval`], never sleeping past the deadline.
    pub fn wait_timeout(&mut self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            match self.poll_exit() {
                Some(ExitState::Exited(_)) => return WaitOutcome::Finished,
                Some(ExitState::Running) => {}
                Some(ExitState::NotStarted | ExitState::Unknown) | None => {
                    return WaitOutcome::Error;
                }
            }

            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    self.limits.poll_interval.min(deadline - now)
                }
                None => self.limits.poll_interval,
            };
            thread::sleep(nap);
        }
    }

    /// Block until the process exits.
    pub fn wait(&mut self) -> WaitOutcome {
        if self.closed {
            return WaitOutcome::Error;
        }
        if self.exit_code.is_some() {
            return WaitOutcome::Finished;
        }
        let Some(child) = self.child.as_mut() else {
            return WaitOutcome::Error;
        };
        match child.wait() {
            Ok(status) => {
                self.exit_code = Some(exit_code_of(status));
                WaitOutcome::Finished
            }
            Err(err) => {
                warn!(pid = self.pid, error = %describe_os_error(&err), "waiting for process failed");
                WaitOutcome::Error
            }
        }
    }

    /// Forcefully terminate the process (SIGKILL).
    ///
    /// Returns whether the termination request succeeded. A process that has
    /// already exited counts as success. Handles are not released; call
    /// [`close`](Self::close) afterwards.
    pub fn kill(&mut self) -> bool {
        match self.poll_exit() {
            Some(ExitState::Exited(_)) => return true,
            Some(ExitState::Running) => {}
            Some(ExitState::NotStarted | ExitState::Unknown) | None => return false,
        }
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.kill() {
            Ok(()) => {
                info!(pid = self.pid, "kill requested");
                self.kill_sent = true;
                true
            }
            Err(err) => {
                warn!(pid = self.pid, error = %describe_os_error(&err), "kill failed");
                false
            }
        }
    }

    /// Where the process is in its lifecycle, without blocking.
    pub fn exit_state(&mut self) -> ExitState {
        self.poll_exit().unwrap_or(ExitState::NotStarted)
    }

    /// Exit code if the process has exited, otherwise `-1`.
    ///
    /// `-1` is ambiguous with a real exit code of `-1`; use
    /// [`exit_state`](Self::exit_state) to tell them apart.
    pub fn exit_code(&mut self) -> i32 {
        self.exit_state().code().unwrap_or(EXIT_CODE_UNAVAILABLE)
    }

    /// Return the output that has arrived since the previous call, without
    /// blocking.
    ///
    /// `None` means nothing is buffered right now; it does not mean the
    /// stream has ended (see [`output_eof`](Self::output_eof)). At most
    /// [`ExecLimits::async_max_read`] bytes are returned per call; the rest
    /// stays queued for the next call.
    pub fn read_output(&mut self) -> Option<Vec<u8>> {
        let (policy, chunk) = self.read_limits();
        self.stdout.as_mut()?.read_available(policy, chunk)
    }

    /// Like [`read_output`](Self::read_output) for separately captured
    /// stderr. Always `None` with merged output.
    pub fn read_error_output(&mut self) -> Option<Vec<u8>> {
        let (policy, chunk) = self.read_limits();
        self.stderr.as_mut()?.read_available(policy, chunk)
    }

    fn read_limits(&self) -> (BufferPolicy, usize) {
        (
            self.limits.buffer.with_max_size(self.limits.async_max_read),
            self.limits.chunk_size,
        )
    }

    /// The output pipe has reached end-of-stream: every byte the child
    /// wrote has been returned by [`read_output`](Self::read_output).
    /// Also `true` for handles without a pipe.
    pub fn output_eof(&self) -> bool {
        self.stdout
            .as_ref()
            .is_none_or(|pipe| pipe.eof || pipe.reader.is_none())
    }

    /// Release the process handle and the pipe read end(s).
    ///
    /// Safe to call more than once. Does not terminate a running process.
    /// After a successful [`kill`](Self::kill) the child is reaped here,
    /// which returns as soon as the signal has taken effect. A child that
    /// was never killed and is still running is released unreaped: it
    /// keeps running, and once it exits it stays a zombie until the host
    /// process reaps it or exits.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(mut child) = self.child.take() {
            if self.exit_code.is_none() {
                let reaped = if self.kill_sent {
                    child.wait().map(Some)
                } else {
                    child.try_wait()
                };
                match reaped {
                    Ok(Some(status)) => self.exit_code = Some(exit_code_of(status)),
                    Ok(None) => {
                        debug!(pid = self.pid, "closing handle of a running process");
                    }
                    Err(err) => {
                        warn!(pid = self.pid, error = %describe_os_error(&err), "reaping process failed");
                    }
                }
            }
            drop(child);
        }
        let mut pipes_closed = 0;
        for pipe in [self.stdout.as_mut(), self.stderr.as_mut()].into_iter().flatten() {
            if pipe.close() {
                pipes_closed += 1;
            }
        }
        self.stdout = None;
        self.stderr = None;

        if self.started {
            debug!(pid = self.pid, pipes_closed, "closed process handle");
        }
    }
}

impl Drop for AsyncProcess {
    fn drop(&mut self) {
        self.close();
    }
}

impl Executor {
    /// Start `command` without waiting for it.
    ///
    /// Always returns a handle; check [`AsyncProcess::started`] and
    /// [`AsyncProcess::error`] to see whether the process was created. A
    /// failed start holds no OS resources.
    pub fn start(&self, command: &str, options: &LaunchOptions) -> AsyncProcess {
        AsyncProcess::start(command, options, self.limits)
    }
}
