// src/exec/pipe.rs

//! Low-level pipe helpers shared by both executors.

use std::io::{self, PipeReader, Read};
use std::os::fd::{AsFd, AsRawFd};

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use tracing::{debug, trace};

use super::buffer::OutputBuffer;
use crate::errors::describe_os_error;

/// Put the read end of a pipe into non-blocking mode.
pub fn set_nonblocking(reader: &PipeReader) -> io::Result<()> {
    let fd = reader.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// Check, without consuming anything, whether a read on `reader` would
/// return immediately (data is buffered or the write end is closed).
pub fn is_readable(reader: &PipeReader) -> io::Result<bool> {
    let mut ready = poll_ready(&[reader], PollTimeout::ZERO)?;
    Ok(ready.pop().unwrap_or(false))
}

/// Wait until at least one of `readers` can be read, returning readiness
/// per reader in the same order.
fn poll_ready(readers: &[&PipeReader], timeout: PollTimeout) -> io::Result<Vec<bool>> {
    let wanted = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
    loop {
        let mut fds: Vec<PollFd<'_>> = readers
            .iter()
            .map(|r| PollFd::new(r.as_fd(), PollFlags::POLLIN))
            .collect();

        match poll(&mut fds, timeout) {
            Ok(_) => {
                return Ok(fds
                    .iter()
                    .map(|fd| fd.revents().is_some_and(|ev| ev.intersects(wanted)))
                    .collect());
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno.into()),
        }
    }
}

/// Result of one non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStep {
    Data(usize),
    WouldBlock,
    Eof,
}

/// Read one chunk from a non-blocking reader, retrying on `EINTR`.
pub fn read_chunk(reader: &mut PipeReader, chunk: &mut [u8]) -> io::Result<ReadStep> {
    loop {
        match reader.read(chunk) {
            Ok(0) => return Ok(ReadStep::Eof),
            Ok(n) => return Ok(ReadStep::Data(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadStep::WouldBlock),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// One captured output stream while it is being drained.
#[derive(Debug)]
pub struct CaptureStream {
    name: &'static str,
    reader: Option<PipeReader>,
    buffer: OutputBuffer,
    warning: Option<String>,
}

impl CaptureStream {
    pub fn new(name: &'static str, reader: PipeReader, buffer: OutputBuffer) -> Self {
        Self {
            name,
            reader: Some(reader),
            buffer,
            warning: None,
        }
    }

    pub fn into_parts(self) -> (OutputBuffer, Option<String>) {
        (self.buffer, self.warning)
    }

    /// Release the read end. The child sees a broken pipe if it keeps
    /// writing after this.
    fn close(&mut self) {
        if self.reader.take().is_some() {
            trace!(stream = self.name, "closed read end");
        }
    }
}

/// Read every stream until end-of-stream, output past the ceiling, or a
/// read error.
///
/// Blocks the calling thread. Streams are multiplexed with `poll(2)` so a
/// child writing heavily to one pipe can never stall on the other.
/// Read errors do not fail the drain: they end that stream and leave a
/// warning next to the bytes already collected.
pub fn drain_to_eof(streams: &mut [CaptureStream], chunk_size: usize) {
    let mut chunk = vec![0u8; chunk_size.max(1)];

    for stream in streams.iter_mut() {
        if let Some(reader) = &stream.reader {
            if let Err(err) = set_nonblocking(reader) {
                stream.warning = Some(describe_os_error(&err));
                stream.close();
            }
        }
    }

    loop {
        let open: Vec<usize> = streams
            .iter()
            .enumerate()
            .filter(|(_, s)| s.reader.is_some())
            .map(|(i, _)| i)
            .collect();
        if open.is_empty() {
            break;
        }

        let ready = {
            let readers: Vec<&PipeReader> = open
                .iter()
                .filter_map(|&i| streams[i].reader.as_ref())
                .collect();
            match poll_ready(&readers, PollTimeout::NONE) {
                Ok(ready) => ready,
                Err(err) => {
                    let message = describe_os_error(&err);
                    for &i in &open {
                        streams[i].warning.get_or_insert_with(|| message.clone());
                        streams[i].close();
                    }
                    break;
                }
            }
        };

        for (&i, is_ready) in open.iter().zip(ready) {
            if is_ready {
                pump_once(&mut streams[i], &mut chunk);
            }
        }
    }
}

fn pump_once(stream: &mut CaptureStream, chunk: &mut [u8]) {
    let Some(reader) = stream.reader.as_mut() else {
        return;
    };

    match read_chunk(reader, chunk) {
        Ok(ReadStep::Data(n)) => {
            // A buffer that is exactly full stays open: the next read tells
            // end-of-stream apart from output lost to the ceiling.
            stream.buffer.push(&chunk[..n]);
            if stream.buffer.truncated() || stream.buffer.exhausted() {
                debug!(
                    stream = stream.name,
                    bytes = stream.buffer.len(),
                    truncated = stream.buffer.truncated(),
                    "stopped reading: output buffer full"
                );
                stream.close();
            }
        }
        Ok(ReadStep::WouldBlock) => {}
        Ok(ReadStep::Eof) => stream.close(),
        Err(err) => {
            stream.warning = Some(describe_os_error(&err));
            stream.close();
        }
    }
}
