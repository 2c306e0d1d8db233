use std::error::Error;

use runlens::cli::LogLevel;
use runlens::logging::build_filter;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn cli_flag_wins_over_environment() -> TestResult {
    let filter = build_filter(Some(LogLevel::Debug), Some("runlens=trace"))?;
    assert_eq!(filter.to_string(), "debug");
    Ok(())
}

#[test]
fn environment_accepts_per_module_directives() -> TestResult {
    build_filter(None, Some("runlens::tree=debug,runlens::provider=info"))?;
    assert_eq!(build_filter(None, Some(" warn "))?.to_string(), "warn");
    Ok(())
}

#[test]
fn defaults_to_info() -> TestResult {
    assert_eq!(build_filter(None, None)?.to_string(), "info");
    assert_eq!(build_filter(None, Some("  "))?.to_string(), "info");
    Ok(())
}

#[test]
fn malformed_environment_value_is_reported() {
    let err = build_filter(None, Some("runlens=loud")).unwrap_err();
    assert!(err.to_string().contains("RUNLENS_LOG"), "{err}");
}
