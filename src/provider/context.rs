// src/provider/context.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::ConfigFile;

/// Per-pipeline state shared by every node of that pipeline's tree.
///
/// Nodes hold an `Arc` to this as a read-only back reference. Only
/// `run_started_at_ms` changes over time, and only through the provider's
/// run hooks.
#[derive(Debug)]
pub struct PipelineRunContext {
    name: String,
    storage_root: PathBuf,
    run_started_at_ms: AtomicU64,
}

impl PipelineRunContext {
    pub fn new(name: impl Into<String>, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            storage_root: storage_root.into(),
            run_started_at_ms: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// `<storage_root>/<name>`: the folder the engine writes runs into.
    pub fn pipeline_path(&self) -> PathBuf {
        self.storage_root.join(&self.name)
    }

    /// Modification time recorded when the current run began.
    ///
    /// Zero until a run has been observed starting, in which case every
    /// task on disk counts as belonging to the current run.
    pub fn run_started_at_ms(&self) -> u64 {
        self.run_started_at_ms.load(Ordering::Acquire)
    }

    pub fn set_run_started_at_ms(&self, ms: u64) {
        self.run_started_at_ms.store(ms, Ordering::Release);
    }
}

/// The set of pipelines the provider knows about, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PipelineRegistry {
    pipelines: BTreeMap<String, Arc<PipelineRunContext>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut registry = Self::new();
        for (name, storage) in cfg.pipeline_storage_paths() {
            registry.insert(PipelineRunContext::new(name, storage));
        }
        registry
    }

    /// Add a pipeline, replacing any previous one of the same name.
    pub fn insert(&mut self, ctx: PipelineRunContext) -> Arc<PipelineRunContext> {
        let ctx = Arc::new(ctx);
        self.pipelines.insert(ctx.name().to_string(), Arc::clone(&ctx));
        ctx
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<PipelineRunContext>> {
        self.pipelines.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PipelineRunContext>> {
        self.pipelines.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PipelineRunContext>> {
        self.pipelines.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// The pipeline whose folder contains `path`, if any.
    pub fn owner_of(&self, path: &Path) -> Option<Arc<PipelineRunContext>> {
        self.pipelines
            .values()
            .find(|ctx| path.starts_with(ctx.pipeline_path()))
            .cloned()
    }
}
