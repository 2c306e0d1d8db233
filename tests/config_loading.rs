use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use runlens::config::{expand_home, load_and_validate, load_from_path};
use runlens::errors::RunlensError;
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn Error>>;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn config_error(contents: &str) -> Result<String, Box<dyn Error>> {
    let file = write_config(contents)?;
    match load_and_validate(file.path()) {
        Err(RunlensError::ConfigError(msg)) => Ok(msg),
        other => Err(format!("expected ConfigError, got {other:?}").into()),
    }
}

#[test]
fn basic_demo_uses_defaults() -> TestResult {
    let cfg = load_and_validate(demo("basic.toml"))?;

    assert!(cfg.config.decorated);
    assert!(cfg.config.hide.is_empty());
    assert_eq!(
        cfg.pipeline_storage_paths(),
        vec![("hello".to_string(), PathBuf::from("/tmp/nextflow-sandbox"))]
    );
    Ok(())
}

#[test]
fn per_pipeline_storage_overrides_the_default() -> TestResult {
    let cfg = load_and_validate(demo("per-pipeline.toml"))?;

    assert!(!cfg.config.decorated);
    assert_eq!(cfg.config.hide, vec!["*.tmp", ".command.trace"]);
    assert_eq!(
        cfg.pipeline_storage_paths(),
        vec![
            ("hello".to_string(), PathBuf::from("/srv/nf")),
            ("rnaseq".to_string(), PathBuf::from("/data/rnaseq-runs")),
        ]
    );
    Ok(())
}

#[test]
fn missing_config_section_falls_back_to_defaults() -> TestResult {
    let file = write_config("[pipeline.hello]\n")?;
    let raw = load_from_path(file.path())?;

    assert_eq!(raw.config.storage_path, "~/nextflow-sandbox");
    assert!(raw.config.decorated);
    assert!(raw.pipeline.contains_key("hello"));
    Ok(())
}

#[test]
fn config_without_pipelines_is_rejected() -> TestResult {
    let msg = config_error("[config]\nstorage_path = \"/srv/nf\"\n")?;
    assert!(msg.contains("at least one [pipeline.<name>]"), "{msg}");
    Ok(())
}

#[test]
fn empty_storage_path_is_rejected() -> TestResult {
    let msg = config_error("[config]\nstorage_path = \"  \"\n\n[pipeline.hello]\n")?;
    assert!(msg.contains("storage_path must not be empty"), "{msg}");

    let msg = config_error("[pipeline.hello]\nstorage_path = \"\"\n")?;
    assert!(msg.contains("pipeline 'hello' has an empty storage_path"), "{msg}");
    Ok(())
}

#[test]
fn invalid_hide_pattern_is_rejected() -> TestResult {
    let msg = config_error("[config]\nhide = [\"[oops\"]\n\n[pipeline.hello]\n")?;
    assert!(msg.contains("invalid pattern '[oops'"), "{msg}");
    Ok(())
}

#[test]
fn pipeline_names_must_be_single_components() -> TestResult {
    let msg = config_error("[pipeline.\"a/b\"]\n")?;
    assert!(msg.contains("single path component"), "{msg}");

    let msg = config_error("[pipeline.\"..\"]\n")?;
    assert!(msg.contains("single path component"), "{msg}");
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let file = write_config("[pipeline.hello\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(RunlensError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Runlens.toml"),
        Err(RunlensError::IoError(_))
    ));
}

#[test]
fn home_is_expanded_only_at_the_start() {
    if let Some(home) = std::env::var_os("HOME") {
        assert_eq!(expand_home("~/runs"), PathBuf::from(&home).join("runs"));
        assert_eq!(expand_home("~"), PathBuf::from(&home));
    }
    assert_eq!(expand_home("/abs/~/x"), PathBuf::from("/abs/~/x"));
    assert_eq!(expand_home("rel/dir"), PathBuf::from("rel/dir"));
}
