// src/errors.rs

//! Crate-wide error type and the OS error reporter.
//!
//! The engine itself never hands an `Err` back across the
//! [`ExecutionResult`](crate::exec::ExecutionResult) /
//! [`AsyncProcess`](crate::exec::AsyncProcess) boundary: failures are turned
//! into a message with [`describe_os_error`] at the point they happen and
//! attached to the returned value. `ProcessError` is what the internal
//! layers and the config loader use to get there.

use std::io;

use nix::errno::Errno;
use thiserror::Error;

/// Upper bound for a rendered OS error message, in bytes.
pub const MAX_ERROR_MESSAGE_LEN: usize = 511;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("empty command line")]
    EmptyCommand,

    #[error("unterminated quote in command line: {0}")]
    UnterminatedQuote(String),

    #[error("failed to create output pipe: {}", describe_os_error(.0))]
    Pipe(#[source] io::Error),

    #[error("failed to start '{program}': {}", describe_os_error(.source))]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {}", describe_os_error(.0))]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ProcessError>;

/// Render an OS-level error as a human-readable message.
///
/// Errors carrying a raw OS code are described with the system's own text
/// for that code (`strerror`), the rest fall back to their `Display`. The
/// result is capped at [`MAX_ERROR_MESSAGE_LEN`] bytes.
///
/// The error must be the one returned by the failing call itself, so the
/// message can never be clobbered by a later OS call on another thread.
pub fn describe_os_error(err: &io::Error) -> String {
    let message = match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => err.to_string(),
    };
    bounded(message)
}

fn bounded(mut message: String) -> String {
    if message.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    message
}
