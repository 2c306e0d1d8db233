// src/tree/node.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::provider::context::PipelineRunContext;

pub use crate::fs::EntryKind;

/// Structural role of a node, fixed when the node is constructed.
///
/// Raw nodes produced by the tree builder are always `Plain` (the pipeline
/// root aside); their Run/Work/Process shape is discovered lazily through the
/// classifier. Decoration stamps the roles it has established onto the nodes
/// it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Pipeline,
    RunFolder,
    WorkFolder,
    ProcessFolder,
    ProcessGroup,
    Plain,
}

/// Memoised answer to one classification predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tri {
    Unknown,
    Yes,
    No,
}

impl Tri {
    const fn to_u8(self) -> u8 {
        match self {
            Tri::Unknown => 0,
            Tri::Yes => 1,
            Tri::No => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Tri::Yes,
            2 => Tri::No,
            _ => Tri::Unknown,
        }
    }
}

/// Lock-free tri-state cell, so cached trees can be shared across tasks.
#[derive(Debug, Default)]
pub(crate) struct TriCell(AtomicU8);

impl TriCell {
    pub(crate) fn get(&self) -> Tri {
        Tri::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store a resolved answer. A resolved value is never overwritten.
    pub(crate) fn resolve(&self, value: bool) -> bool {
        let tri = if value { Tri::Yes } else { Tri::No };
        let _ = self.0.compare_exchange(
            Tri::Unknown.to_u8(),
            tri.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.get() == Tri::Yes
    }
}

impl Clone for TriCell {
    fn clone(&self) -> Self {
        Self(AtomicU8::new(self.0.load(Ordering::Acquire)))
    }
}

/// Classification memo: one flag per predicate.
#[derive(Debug, Clone, Default)]
pub(crate) struct Classification {
    pub(crate) run: TriCell,
    pub(crate) work: TriCell,
    pub(crate) process: TriCell,
}

/// One entry of a pipeline's storage tree, raw or decorated.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name. Process folders may be renamed after their task label.
    pub name: String,
    pub kind: EntryKind,
    pub role: NodeRole,
    /// `None` for synthetic nodes such as process groups.
    pub path: Option<PathBuf>,
    pub owner: Arc<PipelineRunContext>,
    pub status: Option<i32>,
    pub note: Option<String>,
    pub modified_ms: Option<u64>,
    /// Presentation hint: render this node already expanded.
    pub expanded: bool,
    children: Vec<Node>,
    classification: Classification,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        kind: EntryKind,
        path: Option<PathBuf>,
        owner: Arc<PipelineRunContext>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            role: NodeRole::Plain,
            path,
            owner,
            status: None,
            note: None,
            modified_ms: None,
            expanded: false,
            children: Vec::new(),
            classification: Classification::default(),
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, owner: Arc<PipelineRunContext>) -> Self {
        Self::new(name, EntryKind::File, Some(path.into()), owner)
    }

    pub fn dir(name: impl Into<String>, path: impl Into<PathBuf>, owner: Arc<PipelineRunContext>) -> Self {
        Self::new(name, EntryKind::Directory, Some(path.into()), owner)
    }

    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_modified(mut self, ms: Option<u64>) -> Self {
        self.modified_ms = ms;
        self
    }

    /// Replace the children wholesale. Any memoised classification is reset
    /// since it was derived from the old children.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.set_children(children);
        self
    }

    pub fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
        self.classification = Classification::default();
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Move the children out, leaving this node empty.
    pub fn take_children(&mut self) -> Vec<Node> {
        self.classification = Classification::default();
        std::mem::take(&mut self.children)
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Final path component of the node's location, falling back to the name.
    pub fn file_name(&self) -> &str {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or(&self.name)
    }

    pub(crate) fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Structural equality: everything except owner identity and the memo.
    pub fn same_shape(&self, other: &Node) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.role == other.role
            && self.path == other.path
            && self.status == other.status
            && self.note == other.note
            && self.modified_ms == other.modified_ms
            && self.expanded == other.expanded
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(other.children.iter())
                .all(|(a, b)| a.same_shape(b))
    }
}
