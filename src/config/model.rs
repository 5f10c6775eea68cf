// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::exec::buffer::{DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_SIZE};
use crate::exec::{BufferPolicy, DEFAULT_POLL_INTERVAL, ExecLimits, LaunchOptions};
use crate::types::OutputMode;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [output]
/// initial_capacity = 4096
/// max_size = 1048576
/// chunk_size = 4096
/// async_max_read = 1048576
///
/// [launch]
/// merge_stderr = true
/// show_window = false
///
/// [wait]
/// poll_interval_ms = 10
/// ```
///
/// All sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub launch: LaunchSection,

    #[serde(default)]
    pub wait: WaitSection,
}

/// `[output]` section: sizes, in bytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Ceiling for output captured by a blocking execute.
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Ceiling for a single non-blocking read of an async process.
    #[serde(default = "default_max_size")]
    pub async_max_read: usize,
}

fn default_initial_capacity() -> usize {
    DEFAULT_INITIAL_CAPACITY
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_chunk_size() -> usize {
    DEFAULT_INITIAL_CAPACITY
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            max_size: default_max_size(),
            chunk_size: default_chunk_size(),
            async_max_read: default_max_size(),
        }
    }
}

/// `[launch]` section: defaults for how children are started.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchSection {
    /// Route stderr into the stdout pipe.
    #[serde(default = "default_merge_stderr")]
    pub merge_stderr: bool,

    #[serde(default)]
    pub show_window: bool,
}

fn default_merge_stderr() -> bool {
    true
}

impl Default for LaunchSection {
    fn default() -> Self {
        Self {
            merge_stderr: default_merge_stderr(),
            show_window: false,
        }
    }
}

/// `[wait]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for WaitSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)` or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub output: OutputSection,
    pub launch: LaunchSection,
    pub wait: WaitSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        output: OutputSection,
        launch: LaunchSection,
        wait: WaitSection,
    ) -> Self {
        Self {
            output,
            launch,
            wait,
        }
    }

    pub fn buffer_policy(&self) -> BufferPolicy {
        BufferPolicy {
            initial_capacity: self.output.initial_capacity,
            max_size: self.output.max_size,
        }
    }

    pub fn exec_limits(&self) -> ExecLimits {
        ExecLimits {
            buffer: self.buffer_policy(),
            chunk_size: self.output.chunk_size,
            async_max_read: self.output.async_max_read,
            poll_interval: Duration::from_millis(self.wait.poll_interval_ms),
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        if self.launch.merge_stderr {
            OutputMode::Merged
        } else {
            OutputMode::Separate
        }
    }

    /// Launch options carrying this config's defaults.
    pub fn launch_defaults(&self) -> LaunchOptions {
        LaunchOptions::new()
            .show_window(self.launch.show_window)
            .output_mode(self.output_mode())
    }
}
