// src/provider/mod.rs

//! Query surface over every known pipeline's run tree.
//!
//! The provider owns the per-pipeline raw-tree cache and the presentation
//! toggle. Rendering surfaces call [`RunsProvider::get_children`] as nodes
//! are expanded; whoever watches the engine calls [`RunsProvider::refresh`]
//! or the `run_*` hooks when a run starts, produces output or stops.

pub mod cache;
pub mod context;
pub mod item;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::fs::{now_ms, FileSystem};
use crate::tree::sentinel::read_run_name;
use crate::tree::{decorate_run, is_run_folder, sort_nodes, Node, NodeRole, TreeBuilder};

pub use cache::TreeCache;
pub use context::{PipelineRegistry, PipelineRunContext};
pub use item::{open_target, tree_item, Collapsible, ItemContext, OpenTarget, TreeItem};

/// Notifications from whatever launches and monitors the engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started { pipeline: String },
    Updated { pipeline: String },
    Stopped { pipeline: String },
}

impl RunEvent {
    pub fn pipeline(&self) -> &str {
        match self {
            RunEvent::Started { pipeline }
            | RunEvent::Updated { pipeline }
            | RunEvent::Stopped { pipeline } => pipeline,
        }
    }
}

/// Options that influence how the provider presents trees.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Start in decorated presentation.
    pub decorated: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self { decorated: true }
    }
}

pub struct RunsProvider {
    fs: Arc<dyn FileSystem>,
    builder: TreeBuilder,
    registry: RwLock<PipelineRegistry>,
    cache: TreeCache,
    decorated: AtomicBool,
}

impl std::fmt::Debug for RunsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunsProvider")
            .field("decorated", &self.is_decorated())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl RunsProvider {
    pub fn new(builder: TreeBuilder, registry: PipelineRegistry, options: ProviderOptions) -> Self {
        Self {
            fs: Arc::clone(builder.fs()),
            builder,
            registry: RwLock::new(registry),
            cache: TreeCache::new(),
            decorated: AtomicBool::new(options.decorated),
        }
    }

    fn registry(&self) -> std::sync::RwLockReadGuard<'_, PipelineRegistry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn registry_mut(&self) -> std::sync::RwLockWriteGuard<'_, PipelineRegistry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pipeline(&self, name: &str) -> Option<Arc<PipelineRunContext>> {
        self.registry().get(name)
    }

    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Children of `node`, or the pipeline roots when `node` is `None`.
    ///
    /// Never fails: unreadable pipelines or folders come back empty.
    pub async fn get_children(&self, node: Option<&Node>) -> Vec<Node> {
        let Some(node) = node else {
            return self.pipeline_roots().await;
        };

        match node.role {
            NodeRole::Pipeline => self.pipeline_children(node.name.as_str()).await,
            _ if self.is_decorated() && is_run_folder(node) => self.decorated_children(node).await,
            _ => node.children().to_vec(),
        }
    }

    /// One node per known pipeline whose storage folder exists.
    async fn pipeline_roots(&self) -> Vec<Node> {
        let known: Vec<Arc<PipelineRunContext>> = self.registry().iter().cloned().collect();
        let fs = Arc::clone(&self.fs);
        let present = tokio::task::spawn_blocking(move || {
            known
                .into_iter()
                .filter(|ctx| fs.is_dir(&ctx.pipeline_path()))
                .collect::<Vec<_>>()
        })
        .await;

        match present {
            Ok(present) => present
                .into_iter()
                .map(|ctx| {
                    Node::dir(ctx.name().to_string(), ctx.pipeline_path(), Arc::clone(&ctx))
                        .with_role(NodeRole::Pipeline)
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, "pipeline listing task failed");
                Vec::new()
            }
        }
    }

    async fn pipeline_children(&self, name: &str) -> Vec<Node> {
        match self.pipeline_tree(name).await {
            Some(tree) => tree.children().to_vec(),
            None => Vec::new(),
        }
    }

    /// Cached raw tree for a pipeline, built on first use.
    pub async fn pipeline_tree(&self, name: &str) -> Option<Arc<Node>> {
        let Some(ctx) = self.pipeline(name) else {
            warn!(pipeline = %name, "unknown pipeline");
            return None;
        };
        let path = ctx.pipeline_path();
        if !self.fs.is_dir(&path) {
            debug!(pipeline = %name, path = ?path, "pipeline folder missing");
            return None;
        }

        let tree = self
            .cache
            .get_or_build(name, || self.build_pipeline_tree(path, ctx))
            .await;
        Some(tree)
    }

    async fn build_pipeline_tree(&self, path: PathBuf, ctx: Arc<PipelineRunContext>) -> Node {
        info!(pipeline = %ctx.name(), path = ?path, "building run tree");
        let tree = self
            .builder
            .build(path.clone(), Arc::clone(&ctx))
            .await
            .with_role(NodeRole::Pipeline);

        let fs = Arc::clone(&self.fs);
        match tokio::task::spawn_blocking(move || annotate_run_names(fs.as_ref(), tree)).await {
            Ok(tree) => tree,
            Err(err) => {
                warn!(pipeline = %ctx.name(), error = %err, "run name lookup failed");
                Node::dir(ctx.name().to_string(), path, ctx).with_role(NodeRole::Pipeline)
            }
        }
    }

    async fn decorated_children(&self, run: &Node) -> Vec<Node> {
        let fs = Arc::clone(&self.fs);
        let run = run.clone();
        match tokio::task::spawn_blocking(move || decorate_run(fs.as_ref(), &run)).await {
            Ok(decorated) => decorated.into_children(),
            Err(err) => {
                warn!(error = %err, "decoration task failed");
                Vec::new()
            }
        }
    }

    /// Forget the cached tree of one pipeline, or of all of them.
    pub fn refresh(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                if self.cache.invalidate(name) {
                    info!(pipeline = %name, "run tree invalidated");
                }
            }
            None => {
                self.cache.invalidate_all();
                info!("all run trees invalidated");
            }
        }
    }

    pub fn is_decorated(&self) -> bool {
        self.decorated.load(Ordering::Acquire)
    }

    /// Flip between raw and decorated presentation. Returns the new mode.
    pub fn toggle_decorated(&self) -> bool {
        let now = !self.decorated.fetch_xor(true, Ordering::AcqRel);
        debug!(decorated = now, "presentation toggled");
        now
    }

    /// Record the start of a run at the current time.
    ///
    /// Tasks whose folders were last touched before this instant belong to an
    /// earlier run (a resumed run reuses its run folder) and are left out of
    /// the success/failure counts.
    pub fn run_started(&self, name: &str) {
        self.run_started_at(name, now_ms());
    }

    /// [`RunsProvider::run_started`] with an explicit cut-off.
    pub fn run_started_at(&self, name: &str, started_at_ms: u64) {
        if let Some(ctx) = self.pipeline(name) {
            ctx.set_run_started_at_ms(started_at_ms);
            info!(pipeline = %name, started_at_ms, "run started");
        }
        self.refresh(Some(name));
    }

    pub fn run_updated(&self, name: &str) {
        self.refresh(Some(name));
    }

    pub fn run_stopped(&self, name: &str) {
        info!(pipeline = %name, "run stopped");
        self.refresh(Some(name));
    }

    pub fn handle_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Started { pipeline } => self.run_started(pipeline),
            RunEvent::Updated { pipeline } => self.run_updated(pipeline),
            RunEvent::Stopped { pipeline } => self.run_stopped(pipeline),
        }
    }

    pub fn add_pipeline(&self, ctx: PipelineRunContext) -> Arc<PipelineRunContext> {
        let name = ctx.name().to_string();
        let ctx = self.registry_mut().insert(ctx);
        self.cache.invalidate(&name);
        ctx
    }

    /// Forget a pipeline along with its cached tree.
    pub fn remove_pipeline(&self, name: &str) -> bool {
        self.cache.invalidate(name);
        self.registry_mut().remove(name).is_some()
    }

    pub fn tree_item(&self, node: &Node) -> TreeItem {
        tree_item(node)
    }

    pub fn open_target(&self, node: &Node) -> Option<OpenTarget> {
        open_target(node)
    }
}

/// Note each top-level run folder with the run name from its engine log.
fn annotate_run_names(fs: &dyn FileSystem, mut tree: Node) -> Node {
    let mut children = tree.take_children();
    for child in children.iter_mut() {
        if !is_run_folder(child) {
            continue;
        }
        if let Some(run_name) = child.path().and_then(|p| read_run_name(fs, p)) {
            child.note = Some(format!("[{}]", run_name));
        }
    }
    sort_nodes(&mut children);
    tree.set_children(children);
    tree
}
