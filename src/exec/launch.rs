// src/exec/launch.rs

//! Process creation with redirected output.

use std::io::{self, PipeReader};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use nix::sys::signal::Signal;
use tracing::{debug, trace};

use super::command_line::CommandLine;
use crate::errors::{ProcessError, Result};
use crate::types::{EXIT_CODE_UNAVAILABLE, OutputMode};

/// How to launch a child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// `None` runs the child in the caller's current directory.
    pub working_dir: Option<PathBuf>,

    /// When `false` the child is placed in its own process group, so it is
    /// detached from the terminal's job control (no Ctrl-C, no SIGTSTP).
    pub show_window: bool,

    pub output_mode: OutputMode,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory; an empty path means "inherit".
    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.working_dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir.to_path_buf())
        };
        self
    }

    pub fn show_window(mut self, show: bool) -> Self {
        self.show_window = show;
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }
}

/// A freshly started child and the read ends of its output pipes.
#[derive(Debug)]
pub(crate) struct Launched {
    pub child: Child,
    pub stdout: PipeReader,
    /// Only present with [`OutputMode::Separate`].
    pub stderr: Option<PipeReader>,
}

/// Create the output pipe(s) and start `command`.
///
/// The write ends are owned by the `Command` and are closed in this process
/// as soon as the spawn attempt returns, whether it succeeded or not; the
/// child keeps its own copies. Every pipe end created here is dropped on
/// every error path.
pub(crate) fn launch(command: &CommandLine, options: &LaunchOptions) -> Result<Launched> {
    let (stdout_read, stdout_write) = io::pipe().map_err(ProcessError::Pipe)?;

    let (stderr_read, stderr_write) = match options.output_mode {
        OutputMode::Merged => (None, stdout_write.try_clone().map_err(ProcessError::Pipe)?),
        OutputMode::Separate => {
            let (read, write) = io::pipe().map_err(ProcessError::Pipe)?;
            (Some(read), write)
        }
    };

    let mut cmd = Command::new(command.program());
    cmd.args(command.args())
        .stdin(Stdio::inherit())
        .stdout(stdout_write)
        .stderr(stderr_write);

    if let Some(dir) = &options.working_dir {
        cmd.current_dir(dir);
    }
    if !options.show_window {
        cmd.process_group(0);
    }

    let spawned = cmd.spawn();
    drop(cmd);

    let child = spawned.map_err(|source| ProcessError::Spawn {
        program: command.program().to_string(),
        source,
    })?;

    debug!(
        pid = child.id(),
        command = %command,
        cwd = ?options.working_dir,
        mode = ?options.output_mode,
        "process started"
    );

    Ok(Launched {
        child,
        stdout: stdout_read,
        stderr: stderr_read,
    })
}

/// Map an exit status to a single integer code.
///
/// Normal exits report their own code; a child killed by a signal reports
/// `128 + signal`, the convention shells use.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    match status.signal() {
        Some(sig) => {
            let signal_name = Signal::try_from(sig)
                .map(|s| s.as_str())
                .unwrap_or("unknown signal");
            trace!(signal = sig, signal_name, "process terminated by signal");
            128 + sig
        }
        None => EXIT_CODE_UNAVAILABLE,
    }
}
