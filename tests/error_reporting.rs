// tests/error_reporting.rs

use std::io;

use procpipe::errors::{MAX_ERROR_MESSAGE_LEN, ProcessError, describe_os_error};

#[test]
fn os_errors_render_the_system_message() {
    let err = io::Error::from_raw_os_error(2);
    assert_eq!(describe_os_error(&err), "No such file or directory");
}

#[test]
fn non_os_errors_fall_back_to_display() {
    let err = io::Error::other("pipe went away");
    assert_eq!(describe_os_error(&err), "pipe went away");
}

#[test]
fn messages_are_bounded() {
    let err = io::Error::other("é".repeat(600));
    let msg = describe_os_error(&err);

    assert!(msg.len() <= MAX_ERROR_MESSAGE_LEN);
    assert!(msg.chars().all(|c| c == 'é'));
}

#[test]
fn spawn_errors_name_the_program() {
    let err = ProcessError::Spawn {
        program: "frobnicate".to_string(),
        source: io::Error::from_raw_os_error(13),
    };

    assert_eq!(
        err.to_string(),
        "failed to start 'frobnicate': Permission denied"
    );
}
