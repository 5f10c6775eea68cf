// tests/async_process.rs
mod common;
use crate::common::builders::ExecutorBuilder;
use crate::common::{init_tracing, sh, wait_until};

use std::time::Duration;

use nix::sys::wait::waitpid;
use nix::unistd::Pid;
use procpipe::exec::{Executor, LaunchOptions};
use procpipe::types::EXIT_CODE_UNAVAILABLE;
use procpipe::{ExitState, OutputMode, WaitOutcome, start_async};

#[test]
fn sleeping_process_times_out_then_finishes_with_zero() {
    init_tracing();

    let mut proc = start_async("sleep 2", "", false);
    assert!(proc.started());
    assert!(proc.error().is_none());
    assert!(proc.pid() > 0);
    assert!(proc.is_running());

    assert_eq!(proc.wait_timeout(Duration::from_millis(100)), WaitOutcome::TimedOut);
    assert_eq!(proc.exit_state(), ExitState::Running);
    assert_eq!(proc.exit_code(), EXIT_CODE_UNAVAILABLE);

    assert_eq!(proc.wait_timeout(Duration::from_secs(5)), WaitOutcome::Finished);
    assert!(!proc.is_running());
    assert_eq!(proc.exit_code(), 0);
    assert_eq!(proc.exit_state(), ExitState::Exited(0));

    proc.close();
}

#[test]
fn failed_start_carries_error_and_answers_with_sentinels() {
    init_tracing();

    let mut proc = start_async("nonexistent-binary-xyz", "", false);

    assert!(!proc.started());
    assert!(!proc.error().unwrap_or_default().is_empty());
    assert_eq!(proc.pid(), 0);
    assert!(!proc.is_running());
    assert_eq!(proc.exit_code(), EXIT_CODE_UNAVAILABLE);
    assert_eq!(proc.exit_state(), ExitState::NotStarted);
    assert_eq!(proc.read_output(), None);
    assert!(proc.output_eof());
    assert_eq!(proc.wait_timeout(Duration::from_millis(10)), WaitOutcome::Error);
    assert!(!proc.kill());

    proc.close();
}

#[test]
fn kill_stops_a_running_process() {
    init_tracing();

    let mut proc = start_async("sleep 30", "", false);
    assert!(proc.is_running());

    assert!(proc.kill());
    assert!(wait_until(Duration::from_secs(5), || !proc.is_running()));
    assert_eq!(proc.exit_state(), ExitState::Exited(137));
    assert_ne!(proc.exit_code(), EXIT_CODE_UNAVAILABLE);

    proc.close();
}

#[test]
fn kill_after_exit_is_not_an_error() {
    init_tracing();

    let mut proc = start_async("true", "", false);
    assert_eq!(proc.wait(), WaitOutcome::Finished);

    assert!(proc.kill());
    assert_eq!(proc.exit_state(), ExitState::Exited(0));
}

#[test]
fn read_output_returns_only_new_bytes() {
    init_tracing();

    let mut proc = start_async(&sh("printf first; sleep 1; printf second"), "", false);
    assert!(proc.started());

    let mut first = Vec::new();
    assert!(wait_until(Duration::from_secs(3), || {
        if let Some(bytes) = proc.read_output() {
            first.extend(bytes);
        }
        first == b"first"
    }));

    // Nothing new yet: "second" is a second away.
    assert_eq!(proc.read_output(), None);
    assert!(!proc.output_eof());

    let mut second = Vec::new();
    assert!(wait_until(Duration::from_secs(3), || {
        if let Some(bytes) = proc.read_output() {
            second.extend(bytes);
        }
        second == b"second"
    }));

    assert_eq!(proc.wait_timeout(Duration::from_secs(5)), WaitOutcome::Finished);
    assert!(wait_until(Duration::from_secs(2), || {
        assert_eq!(proc.read_output(), None);
        proc.output_eof()
    }));
}

#[test]
fn read_output_respects_per_call_ceiling_without_losing_data() {
    init_tracing();

    let executor = ExecutorBuilder::new().async_max_read(10).build();
    let mut proc = executor.start(&sh("printf 0123456789abcdefghij"), &LaunchOptions::new());
    assert_eq!(proc.wait_timeout(Duration::from_secs(5)), WaitOutcome::Finished);

    assert_eq!(proc.read_output().as_deref(), Some(&b"0123456789"[..]));
    assert_eq!(proc.read_output().as_deref(), Some(&b"abcdefghij"[..]));
    assert_eq!(proc.read_output(), None);
}

#[test]
fn separate_mode_exposes_stderr_reader() {
    init_tracing();

    let options = LaunchOptions::new().output_mode(OutputMode::Separate);
    let mut proc = Executor::default().start(&sh("echo out; echo err 1>&2"), &options);
    assert_eq!(proc.wait_timeout(Duration::from_secs(5)), WaitOutcome::Finished);

    assert_eq!(proc.read_output().as_deref(), Some(&b"out\n"[..]));
    assert_eq!(proc.read_error_output().as_deref(), Some(&b"err\n"[..]));
}

#[test]
fn merged_mode_has_no_stderr_reader() {
    init_tracing();

    let mut proc = start_async(&sh("echo err 1>&2"), "", false);
    assert_eq!(proc.wait_timeout(Duration::from_secs(5)), WaitOutcome::Finished);

    assert_eq!(proc.read_error_output(), None);
    assert_eq!(proc.read_output().as_deref(), Some(&b"err\n"[..]));
}

#[test]
fn close_is_idempotent_and_disables_the_handle() {
    init_tracing();

    let mut proc = start_async("sleep 5", "", false);
    assert!(proc.kill());
    assert_eq!(proc.wait_timeout(Duration::from_secs(5)), WaitOutcome::Finished);

    proc.close();
    proc.close();

    assert!(proc.is_closed());
    assert_eq!(proc.pid(), 0);
    assert!(!proc.is_running());
    assert_eq!(proc.exit_state(), ExitState::NotStarted);
    assert_eq!(proc.exit_code(), EXIT_CODE_UNAVAILABLE);
    assert_eq!(proc.read_output(), None);
    assert!(!proc.kill());
    assert_eq!(proc.wait_timeout(Duration::from_millis(10)), WaitOutcome::Error);
    assert_eq!(proc.wait(), WaitOutcome::Error);
}

#[test]
fn exit_code_of_failed_command_is_reported() {
    init_tracing();

    let mut proc = start_async(&sh("exit 42"), "", false);
    assert_eq!(proc.wait_timeout(Duration::from_secs(5)), WaitOutcome::Finished);
    assert_eq!(proc.exit_code(), 42);
}

/// Scheduler state letter from `/proc/<pid>/stat`, or `None` once the pid
/// is gone.
#[cfg(target_os = "linux")]
fn proc_state(pid: u32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let after_name = &stat[stat.rfind(')')? + 1..];
    after_name.trim_start().chars().next()
}

#[cfg(target_os = "linux")]
#[test]
fn kill_then_close_reaps_the_child() {
    init_tracing();

    let mut proc = start_async("sleep 30", "", false);
    let pid = proc.pid();
    assert!(proc.is_running());

    assert!(proc.kill());
    proc.close();

    std::thread::sleep(Duration::from_millis(300));
    let state = proc_state(pid);
    assert_ne!(state, Some('Z'), "killed child left as a zombie");
    assert!(state.is_none(), "child {pid} still present in state {state:?}");
}

#[test]
fn lost_status_is_reported_as_unknown_everywhere() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut proc = start_async("true", "", false);
    let pid = i32::try_from(proc.pid())?;

    // Reap it outside the handle so its own status query fails.
    waitpid(Pid::from_raw(pid), None)?;

    assert!(!proc.is_running());
    assert_eq!(proc.exit_state(), ExitState::Unknown);
    assert_eq!(proc.exit_code(), EXIT_CODE_UNAVAILABLE);
    assert_eq!(proc.wait_timeout(Duration::from_millis(10)), WaitOutcome::Error);
    assert!(!proc.kill());

    proc.close();
    Ok(())
}
