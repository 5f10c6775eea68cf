// src/exec/buffer.rs

//! Growable output buffer with a hard ceiling.
//!
//! Both execution modes accumulate child output through [`OutputBuffer`]:
//!
//! - capacity starts at [`BufferPolicy::initial_capacity`] and doubles on
//!   overflow, never past [`BufferPolicy::max_size`];
//! - a chunk that does not fit is accepted up to the remaining headroom and
//!   the buffer reports itself full (truncation is not an error);
//! - if growing fails to allocate, accumulation stops and everything
//!   collected so far is kept.

use std::collections::TryReserveError;

use tracing::{debug, warn};

/// Default starting capacity, also the default pipe read chunk size.
pub const DEFAULT_INITIAL_CAPACITY: usize = 4096;

/// Default ceiling for captured output (1 MiB).
pub const DEFAULT_MAX_SIZE: usize = 1024 * 1024;

/// Sizing policy for an [`OutputBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPolicy {
    pub initial_capacity: usize,
    pub max_size: usize,
}

impl Default for BufferPolicy {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl BufferPolicy {
    /// Same policy with a different ceiling. The initial capacity is
    /// clamped so it never exceeds the new ceiling.
    pub fn with_max_size(self, max_size: usize) -> Self {
        Self {
            initial_capacity: self.initial_capacity.min(max_size),
            max_size,
        }
    }
}

#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<u8>,
    /// Logical capacity under the doubling policy (the `Vec` may hold more).
    capacity: usize,
    max_size: usize,
    truncated: bool,
    exhausted: bool,
}

impl OutputBuffer {
    pub fn new(policy: BufferPolicy) -> Self {
        let initial = policy.initial_capacity.min(policy.max_size);
        let mut data = Vec::new();
        let exhausted = reserve(&mut data, initial).is_err();
        if exhausted {
            warn!(bytes = initial, "could not allocate initial output buffer");
        }
        Self {
            data,
            capacity: if exhausted { 0 } else { initial },
            max_size: policy.max_size,
            truncated: false,
            exhausted,
        }
    }

    /// Append as much of `chunk` as the policy allows.
    ///
    /// Returns the number of bytes accepted. Once this is less than
    /// `chunk.len()` the buffer is full and every later push accepts 0.
    pub fn push(&mut self, chunk: &[u8]) -> usize {
        if chunk.is_empty() {
            return 0;
        }
        if self.is_full() {
            if !self.exhausted {
                self.truncated = true;
            }
            return 0;
        }

        let needed = self.data.len() + chunk.len();
        let grown = needed <= self.capacity || self.grow_to_fit(needed);

        // After a failed growth only the space already reserved is used.
        let take = chunk.len().min(self.capacity - self.data.len());
        self.data.extend_from_slice(&chunk[..take]);

        if grown && take < chunk.len() {
            self.truncated = true;
            debug!(
                kept = self.data.len(),
                dropped = chunk.len() - take,
                max_size = self.max_size,
                "output reached ceiling; dropping the rest"
            );
        }
        take
    }

    /// Double capacity (capped at the ceiling) until `needed` fits or the
    /// ceiling is reached. Returns `false` only on allocation failure.
    fn grow_to_fit(&mut self, needed: usize) -> bool {
        let mut target = self.capacity.max(1);
        while target < needed && target < self.max_size {
            target = target.saturating_mul(2).min(self.max_size);
        }
        let target = target.min(self.max_size);
        if target <= self.capacity {
            return true;
        }

        let additional = target - self.data.len();
        match reserve(&mut self.data, additional) {
            Ok(()) => {
                self.capacity = target;
                true
            }
            Err(err) => {
                warn!(
                    kept = self.data.len(),
                    requested = target,
                    error = %err,
                    "output buffer growth failed; keeping collected output"
                );
                self.exhausted = true;
                false
            }
        }
    }

    /// No further bytes will be accepted: ceiling reached or allocation
    /// failed.
    pub fn is_full(&self) -> bool {
        self.exhausted || self.data.len() >= self.max_size
    }

    /// Some input was dropped because of the ceiling.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Growth failed to allocate at some point.
    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    /// Remaining room before the ceiling.
    pub fn headroom(&self) -> usize {
        if self.exhausted {
            0
        } else {
            self.max_size.saturating_sub(self.data.len())
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn reserve(data: &mut Vec<u8>, additional: usize) -> Result<(), TryReserveError> {
    #[cfg(test)]
    if reserve_hook::should_fail() {
        // Cannot be satisfied: yields a genuine `TryReserveError`.
        return Vec::<u8>::new().try_reserve_exact(usize::MAX);
    }
    data.try_reserve_exact(additional)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_growth_keeps_collected_bytes_and_stops() {
        reserve_hook::fail_after(1);
        let mut buf = OutputBuffer::new(BufferPolicy {
            initial_capacity: 8,
            max_size: 1024,
        });
        assert_eq!(buf.push(b"abcd"), 4);

        // Needs growth: only the reserved room is filled, then nothing more.
        assert_eq!(buf.push(b"efghijkl"), 4);
        reserve_hook::reset();

        assert!(buf.exhausted());
        assert!(buf.is_full());
        assert!(!buf.truncated());
        assert_eq!(buf.headroom(), 0);
        assert_eq!(buf.as_bytes(), b"abcdefgh");
        assert_eq!(buf.push(b"more"), 0);
        assert_eq!(buf.as_bytes(), b"abcdefgh");
        assert!(!buf.truncated());
    }

    #[test]
    fn failed_initial_allocation_accepts_nothing() {
        reserve_hook::fail_after(0);
        let mut buf = OutputBuffer::new(BufferPolicy::default());
        reserve_hook::reset();

        assert!(buf.exhausted());
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.push(b"data"), 0);
        assert!(buf.is_empty());
    }
}
