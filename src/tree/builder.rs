// src/tree/builder.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::fs::{EntryKind, FileSystem};
use crate::provider::context::PipelineRunContext;
use crate::tree::node::Node;
use crate::tree::sort::sort_nodes;

/// Entries the sandbox itself keeps inside a pipeline folder. Never shown.
pub const RESERVED_NAMES: [&str; 2] = ["settings.json", ".nextflow"];

/// Walks a storage path into a raw, unclassified [`Node`] tree.
///
/// The walk is eager and depth-first. The canonical paths of the directories
/// currently being walked are tracked, so a symlink back into an ancestor is
/// shown as an empty directory instead of recursing forever.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    fs: Arc<dyn FileSystem>,
    hidden: GlobSet,
}

impl TreeBuilder {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            hidden: GlobSet::empty(),
        }
    }

    /// Additionally hide entries whose name matches any of `patterns`.
    pub fn with_hidden_patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        self.hidden = builder.build()?;
        Ok(self)
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Build the tree rooted at `root` on the blocking pool.
    pub async fn build(&self, root: PathBuf, owner: Arc<PipelineRunContext>) -> Node {
        let builder = self.clone();
        let fallback_root = root.clone();
        let fallback_owner = Arc::clone(&owner);
        match tokio::task::spawn_blocking(move || builder.build_blocking(&root, owner)).await {
            Ok(node) => node,
            Err(err) => {
                warn!(root = ?fallback_root, error = %err, "tree build task failed");
                Self::root_node(&fallback_root, fallback_owner)
            }
        }
    }

    /// Synchronous walk; [`TreeBuilder::build`] wraps this.
    pub fn build_blocking(&self, root: &Path, owner: Arc<PipelineRunContext>) -> Node {
        let mut node = Self::root_node(root, Arc::clone(&owner));
        if let Ok(meta) = self.fs.metadata(root) {
            node.modified_ms = meta.modified_ms;
        }
        let mut visited = HashSet::new();
        let children = self.walk(root, &owner, &mut visited);
        node.set_children(children);
        node
    }

    fn root_node(root: &Path, owner: Arc<PipelineRunContext>) -> Node {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.to_string_lossy().into_owned());
        Node::dir(name, root, owner)
    }

    fn walk(
        &self,
        dir: &Path,
        owner: &Arc<PipelineRunContext>,
        visited: &mut HashSet<PathBuf>,
    ) -> Vec<Node> {
        let key = self
            .fs
            .canonicalize(dir)
            .unwrap_or_else(|_| dir.to_path_buf());
        if !visited.insert(key.clone()) {
            warn!(path = ?dir, target = ?key, "symlink cycle detected; not descending");
            return Vec::new();
        }

        let entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = ?dir, error = %err, "failed to list directory; leaving it empty");
                visited.remove(&key);
                return Vec::new();
            }
        };

        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.is_hidden(&entry.name) {
                debug!(path = ?entry.path, "hidden entry skipped");
                continue;
            }
            let mut node = Node::new(
                entry.name,
                entry.meta.kind,
                Some(entry.path.clone()),
                Arc::clone(owner),
            )
            .with_modified(entry.meta.modified_ms);
            if entry.meta.kind == EntryKind::Directory {
                node.set_children(self.walk(&entry.path, owner, visited));
            }
            nodes.push(node);
        }
        visited.remove(&key);
        sort_nodes(&mut nodes);
        nodes
    }

    fn is_hidden(&self, name: &str) -> bool {
        RESERVED_NAMES.contains(&name) || self.hidden.is_match(name)
    }
}
