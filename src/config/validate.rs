// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunlensError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RunlensError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.pipeline))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_pipelines(cfg)?;
    validate_global_config(cfg)?;
    validate_pipeline_names(cfg)?;
    Ok(())
}

fn ensure_has_pipelines(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.is_empty() {
        return Err(RunlensError::ConfigError(
            "config must contain at least one [pipeline.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.storage_path.trim().is_empty() {
        return Err(RunlensError::ConfigError(
            "[config].storage_path must not be empty".to_string(),
        ));
    }

    for pattern in cfg.config.hide.iter() {
        Glob::new(pattern).map_err(|e| {
            RunlensError::ConfigError(format!(
                "invalid pattern '{}' in [config].hide: {}",
                pattern, e
            ))
        })?;
    }

    Ok(())
}

fn validate_pipeline_names(cfg: &RawConfigFile) -> Result<()> {
    for (name, pipeline) in cfg.pipeline.iter() {
        if name.trim().is_empty() {
            return Err(RunlensError::ConfigError(
                "pipeline name must not be empty".to_string(),
            ));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(RunlensError::ConfigError(format!(
                "pipeline name '{}' must be a single path component",
                name
            )));
        }
        if let Some(path) = pipeline.storage_path.as_deref() {
            if path.trim().is_empty() {
                return Err(RunlensError::ConfigError(format!(
                    "pipeline '{}' has an empty storage_path",
                    name
                )));
            }
        }
    }
    Ok(())
}
