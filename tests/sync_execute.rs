// tests/sync_execute.rs
mod common;
use crate::common::builders::ExecutorBuilder;
use crate::common::{init_tracing, sh};

use std::error::Error;

use procpipe::exec::{Executor, LaunchOptions};
use procpipe::{OutputMode, execute, execute_with_args};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn echo_hello_captures_output_and_zero_exit() {
    init_tracing();

    let result = execute("echo hello", "", false);

    assert!(result.success());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.output(), b"hello\n");
    assert!(result.error().is_none());
    assert!(!result.truncated());
}

#[test]
fn missing_binary_reports_failure_with_message() {
    init_tracing();

    let result = execute("nonexistent-binary-xyz", "", false);

    assert!(!result.success());
    let msg = result.error().expect("failed start must carry a message");
    assert!(!msg.is_empty());
    assert!(msg.contains("nonexistent-binary-xyz"), "got: {msg}");
    assert!(result.output().is_empty());
}

#[test]
fn empty_command_is_rejected_without_spawning() {
    init_tracing();

    let result = execute("   ", "", false);

    assert!(!result.success());
    assert_eq!(result.error(), Some("empty command line"));
}

#[test]
fn exact_byte_count_and_exit_code_are_reported() {
    init_tracing();

    let result = execute(&sh("printf abcdef; exit 3"), "", false);

    assert!(result.success());
    assert_eq!(result.exit_code(), 3);
    assert_eq!(result.output(), b"abcdef");
}

#[test]
fn output_larger_than_initial_capacity_is_kept_whole() {
    init_tracing();

    let result = execute(&sh("head -c 200000 /dev/zero"), "", false);

    assert!(result.success());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.output().len(), 200_000);
    assert!(!result.truncated());
}

#[test]
fn stderr_is_merged_into_output_by_default() {
    init_tracing();

    let result = execute(&sh("echo out; echo err 1>&2"), "", false);

    assert!(result.success());
    assert_eq!(result.output_lossy(), "out\nerr\n");
    assert!(result.stderr().is_none());
}

#[test]
fn separate_mode_captures_stderr_on_its_own() {
    init_tracing();

    let options = LaunchOptions::new().output_mode(OutputMode::Separate);
    let result = Executor::default().execute(&sh("echo out; echo err 1>&2; exit 2"), &options);

    assert!(result.success());
    assert_eq!(result.exit_code(), 2);
    assert_eq!(result.output(), b"out\n");
    assert_eq!(result.stderr(), Some(&b"err\n"[..]));
}

#[test]
fn output_is_capped_at_ceiling_without_error() {
    init_tracing();

    let executor = ExecutorBuilder::new().max_size(100).chunk_size(64).build();
    let result = executor.execute(&sh("head -c 5000 /dev/zero"), &LaunchOptions::new());

    assert!(result.success());
    assert_eq!(result.output().len(), 100);
    assert!(result.truncated());
    assert!(result.error().is_none(), "truncation must not be an error");
}

#[test]
fn ceiling_that_is_a_multiple_of_the_chunk_size_still_reports_truncation() {
    init_tracing();

    let executor = ExecutorBuilder::new().max_size(8192).chunk_size(4096).build();
    let result = executor.execute("head -c 20000 /dev/zero", &LaunchOptions::new());

    assert!(result.success());
    assert_eq!(result.output().len(), 8192);
    assert!(result.truncated());
}

#[test]
fn output_exactly_at_ceiling_is_not_truncated() {
    init_tracing();

    let executor = ExecutorBuilder::new().max_size(8192).chunk_size(4096).build();
    let result = executor.execute("head -c 8192 /dev/zero", &LaunchOptions::new());

    assert!(result.success());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.output().len(), 8192);
    assert!(!result.truncated());
}

#[test]
fn default_ceiling_reports_truncation() {
    init_tracing();

    let result = execute("head -c 3000000 /dev/zero", "", false);

    assert!(result.success());
    assert_eq!(result.output().len(), 1024 * 1024);
    assert!(result.truncated());
    assert!(result.error().is_none());
}

#[test]
fn endless_producer_is_cut_off_at_ceiling_and_returns() {
    init_tracing();

    let executor = ExecutorBuilder::new().max_size(1000).build();
    let result = executor.execute("yes", &LaunchOptions::new());

    assert!(result.success());
    assert_eq!(result.output().len(), 1000);
    assert!(result.output().starts_with(b"y\ny\n"));
    assert!(result.truncated());
}

#[test]
fn working_directory_is_applied() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let expected = dir.path().canonicalize()?;

    let result = execute("pwd", &dir.path().to_string_lossy(), false);

    assert!(result.success());
    assert_eq!(result.output_lossy().trim_end(), expected.to_string_lossy());
    Ok(())
}

#[test]
fn missing_working_directory_fails_to_start() {
    init_tracing();

    let result = execute("echo hi", "/definitely/not/a/real/dir", false);

    assert!(!result.success());
    assert!(result.error().is_some());
}

#[test]
fn execute_with_args_joins_program_and_args() {
    init_tracing();

    let with_args = execute_with_args("echo", "a b", "", false);
    assert_eq!(with_args.output(), b"a b\n");

    let without_args = execute_with_args("echo", "", "", false);
    assert_eq!(without_args.output(), b"\n");
}

#[test]
fn quoted_arguments_reach_the_child_intact() {
    init_tracing();

    let result = execute(r#"printf "%s|%s" "two words" plain"#, "", false);

    assert!(result.success());
    assert_eq!(result.output(), b"two words|plain");
}

#[test]
fn no_shell_features_are_interpreted() {
    init_tracing();

    let result = execute("echo $HOME | cat > out.txt", "", false);

    assert!(result.success());
    assert_eq!(result.output(), b"$HOME | cat > out.txt\n");
}

#[test]
fn signal_termination_maps_to_128_plus_signal() {
    init_tracing();

    let result = execute(&sh("kill -9 $$"), "", false);

    assert!(result.success());
    assert_eq!(result.exit_code(), 137);
}

#[test]
fn hidden_window_and_shown_window_both_run() {
    init_tracing();

    for show in [false, true] {
        let result = execute("echo ok", "", show);
        assert!(result.success());
        assert_eq!(result.output(), b"ok\n");
    }
}
