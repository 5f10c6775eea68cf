// tests/output_buffer.rs

use proptest::prelude::*;
use procpipe::exec::{BufferPolicy, OutputBuffer};

fn policy(initial_capacity: usize, max_size: usize) -> BufferPolicy {
    BufferPolicy {
        initial_capacity,
        max_size,
    }
}

#[test]
fn default_policy_is_4k_growing_to_1mib() {
    let p = BufferPolicy::default();
    assert_eq!(p.initial_capacity, 4096);
    assert_eq!(p.max_size, 1024 * 1024);
}

#[test]
fn capacity_doubles_on_overflow() {
    let mut buf = OutputBuffer::new(policy(8, 1024));
    assert_eq!(buf.capacity(), 8);

    assert_eq!(buf.push(&[1; 8]), 8);
    assert_eq!(buf.capacity(), 8);

    assert_eq!(buf.push(&[2; 1]), 1);
    assert_eq!(buf.capacity(), 16);

    assert_eq!(buf.push(&[3; 20]), 20);
    assert_eq!(buf.capacity(), 32);
    assert_eq!(buf.len(), 29);
    assert!(!buf.truncated());
}

#[test]
fn growth_stops_at_ceiling() {
    let mut buf = OutputBuffer::new(policy(8, 20));

    assert_eq!(buf.push(&[0; 12]), 12);
    assert_eq!(buf.capacity(), 16);

    assert_eq!(buf.push(&[0; 6]), 6);
    assert_eq!(buf.capacity(), 20);
    assert!(!buf.is_full());
}

#[test]
fn oversized_chunk_is_accepted_up_to_headroom() {
    let mut buf = OutputBuffer::new(policy(4, 10));
    assert_eq!(buf.push(b"abcdef"), 6);

    assert_eq!(buf.headroom(), 4);
    assert_eq!(buf.push(b"ghijklmn"), 4);

    assert!(buf.is_full());
    assert!(buf.truncated());
    assert_eq!(buf.as_bytes(), b"abcdefghij");
}

#[test]
fn full_buffer_takes_nothing_more() {
    let mut buf = OutputBuffer::new(policy(4, 4));
    assert_eq!(buf.push(b"abcd"), 4);
    assert!(buf.is_full());
    assert!(!buf.truncated());

    assert_eq!(buf.push(b"e"), 0);
    assert!(buf.truncated());
    assert_eq!(buf.into_bytes(), b"abcd");
}

#[test]
fn empty_push_is_a_no_op() {
    let mut buf = OutputBuffer::new(BufferPolicy::default());
    assert_eq!(buf.push(&[]), 0);
    assert!(buf.is_empty());
    assert!(!buf.truncated());
}

#[test]
fn unallocatable_initial_capacity_leaves_an_exhausted_empty_buffer() {
    let huge = isize::MAX as usize + 1;
    let mut buf = OutputBuffer::new(policy(huge, huge));

    assert!(buf.exhausted());
    assert!(buf.is_full());
    assert_eq!(buf.headroom(), 0);
    assert_eq!(buf.push(b"data"), 0);
    assert!(buf.is_empty());
    assert!(!buf.truncated(), "allocation failure is not ceiling truncation");
}

#[test]
fn initial_capacity_is_clamped_to_ceiling() {
    let buf = OutputBuffer::new(BufferPolicy::default().with_max_size(100));
    assert_eq!(buf.capacity(), 100);
}

proptest! {
    #[test]
    fn never_exceeds_ceiling_and_keeps_a_prefix(
        initial in 1usize..64,
        max_size in 1usize..512,
        chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..128), 0..16),
    ) {
        let mut buf = OutputBuffer::new(policy(initial, max_size));
        let mut all = Vec::new();
        for chunk in &chunks {
            buf.push(chunk);
            all.extend_from_slice(chunk);
        }

        prop_assert!(buf.len() <= max_size);
        prop_assert!(buf.capacity() <= max_size);
        prop_assert_eq!(buf.len(), all.len().min(max_size));
        prop_assert_eq!(buf.as_bytes(), &all[..buf.len()]);
        prop_assert_eq!(buf.truncated(), all.len() > max_size);
    }
}
