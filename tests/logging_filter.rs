// tests/logging_filter.rs

use procpipe::cli::LogLevel;
use procpipe::logging::filter_directives;
use tracing_subscriber::EnvFilter;

#[test]
fn defaults_to_warn() {
    assert_eq!(filter_directives(None, None), "warn");
    assert_eq!(filter_directives(None, Some("   ")), "warn");
}

#[test]
fn env_directives_are_passed_through() {
    assert_eq!(
        filter_directives(None, Some(" warn,procpipe::exec=trace ")),
        "warn,procpipe::exec=trace"
    );
}

#[test]
fn cli_level_wins_and_is_scoped_to_this_crate() {
    assert_eq!(
        filter_directives(Some(LogLevel::Debug), Some("trace")),
        "warn,procpipe=debug"
    );
}

#[test]
fn every_cli_level_yields_a_valid_filter() {
    for level in [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ] {
        let directives = filter_directives(Some(level), None);
        assert!(EnvFilter::try_new(&directives).is_ok(), "{directives}");
    }
}
