#![allow(dead_code)]

use std::time::Duration;

use procpipe::config::{ConfigFile, RawConfigFile};
use procpipe::exec::{BufferPolicy, ExecLimits, Executor};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.config.output.initial_capacity = bytes;
        self
    }

    pub fn max_size(mut self, bytes: usize) -> Self {
        self.config.output.max_size = bytes;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.output.chunk_size = bytes;
        self
    }

    pub fn async_max_read(mut self, bytes: usize) -> Self {
        self.config.output.async_max_read = bytes;
        self
    }

    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.config.launch.merge_stderr = merge;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.wait.poll_interval_ms = ms;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an `Executor` with small, test-friendly limits.
pub struct ExecutorBuilder {
    limits: ExecLimits,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self {
            limits: ExecLimits::default(),
        }
    }

    /// Ceiling for blocking execution; the initial capacity is clamped to it.
    pub fn max_size(mut self, bytes: usize) -> Self {
        self.limits.buffer = self.limits.buffer.with_max_size(bytes);
        self
    }

    pub fn buffer(mut self, policy: BufferPolicy) -> Self {
        self.limits.buffer = policy;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.limits.chunk_size = bytes;
        self
    }

    pub fn async_max_read(mut self, bytes: usize) -> Self {
        self.limits.async_max_read = bytes;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.limits.poll_interval = interval;
        self
    }

    pub fn build(self) -> Executor {
        Executor::new(self.limits)
    }
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
