use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use procpipe::follow::ProcessControl;
use procpipe::types::ExitState;

/// Exit code a `FakeProcess` reports after being killed (128 + SIGKILL).
pub const KILLED_EXIT_CODE: i32 = 137;

/// A scripted process that never touches the OS.
///
/// - Each `is_running` call consumes one "tick" of remaining lifetime;
///   once they run out the process has exited with `exit_code`.
/// - Each `read_output` call pops the next scripted chunk (`None` entries
///   simulate "no data right now").
/// - `kill` ends the process at the next status check with
///   [`KILLED_EXIT_CODE`] and records that it was called.
pub struct FakeProcess {
    ticks_left: usize,
    exit_code: i32,
    chunks: VecDeque<Option<Vec<u8>>>,
    exited: bool,
    killed: Arc<Mutex<bool>>,
}

impl FakeProcess {
    pub fn new(running_ticks: usize, exit_code: i32) -> Self {
        Self {
            ticks_left: running_ticks,
            exit_code,
            chunks: VecDeque::new(),
            exited: false,
            killed: Arc::new(Mutex::new(false)),
        }
    }

    /// A process that never exits on its own.
    pub fn endless() -> Self {
        Self::new(usize::MAX, 0)
    }

    pub fn with_chunk(mut self, chunk: &[u8]) -> Self {
        self.chunks.push_back(Some(chunk.to_vec()));
        self
    }

    pub fn with_gap(mut self) -> Self {
        self.chunks.push_back(None);
        self
    }

    /// Shared flag that flips to `true` when `kill` is called.
    pub fn killed_flag(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.killed)
    }
}

impl ProcessControl for FakeProcess {
    fn pid(&self) -> u32 {
        4242
    }

    fn is_running(&mut self) -> bool {
        if self.exited {
            return false;
        }
        if self.ticks_left == 0 {
            self.exited = true;
            return false;
        }
        self.ticks_left -= 1;
        true
    }

    fn read_output(&mut self) -> Option<Vec<u8>> {
        self.chunks.pop_front().flatten()
    }

    fn output_eof(&self) -> bool {
        self.exited && self.chunks.is_empty()
    }

    fn kill(&mut self) -> bool {
        *self.killed.lock().unwrap() = true;
        if !self.exited {
            self.exit_code = KILLED_EXIT_CODE;
            self.ticks_left = 0;
        }
        true
    }

    fn exit_state(&mut self) -> ExitState {
        if self.exited {
            ExitState::Exited(self.exit_code)
        } else {
            ExitState::Running
        }
    }
}
