// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// storage_path = "~/nextflow-sandbox"
/// decorated = true
/// hide = ["*.tmp"]
///
/// [pipeline.hello]
///
/// [pipeline.rnaseq]
/// storage_path = "/data/nf"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All pipelines from `[pipeline.<name>]`, keyed by pipeline name.
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub pipeline: BTreeMap<String, PipelineConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        pipeline: BTreeMap<String, PipelineConfig>,
    ) -> Self {
        Self { config, pipeline }
    }

    /// Storage root for each pipeline, with `~/` expanded.
    pub fn pipeline_storage_paths(&self) -> Vec<(String, PathBuf)> {
        self.pipeline
            .iter()
            .map(|(name, p)| {
                let raw = p
                    .storage_path
                    .as_deref()
                    .unwrap_or(&self.config.storage_path);
                (name.clone(), expand_home(raw))
            })
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Default storage root; each pipeline lives in `<storage_path>/<name>`.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Start in decorated (grouped, labelled) presentation.
    #[serde(default = "default_decorated")]
    pub decorated: bool,

    /// Extra glob patterns, matched against entry names, hidden from the tree.
    ///
    /// `settings.json` and `.nextflow` are always hidden.
    #[serde(default)]
    pub hide: Vec<String>,
}

fn default_storage_path() -> String {
    "~/nextflow-sandbox".to_string()
}

fn default_decorated() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            decorated: default_decorated(),
            hide: Vec::new(),
        }
    }
}

/// `[pipeline.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineConfig {
    /// Overrides `[config].storage_path` for this pipeline.
    #[serde(default)]
    pub storage_path: Option<String>,
}

/// Expand a leading `~/` using `HOME`. Other paths are returned as-is.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" || raw.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let rest = raw.trim_start_matches('~').trim_start_matches('/');
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}
