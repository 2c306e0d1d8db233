// src/provider/item.rs

//! What a rendering surface needs to draw a node and act on it.

use std::path::PathBuf;

use crate::tree::{Node, NodeRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collapsible {
    None,
    Collapsed,
    Expanded,
}

/// Tag a rendering surface can key context menus on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemContext {
    Pipeline,
    File,
    Directory,
    ProcessFolder,
    ProcessGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    pub description: Option<String>,
    pub collapsible: Collapsible,
    pub context: ItemContext,
    pub tooltip: Option<String>,
}

/// Hand-off to an external "open" collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    ShowFile(PathBuf),
    OpenTerminal(PathBuf),
}

pub fn tree_item(node: &Node) -> TreeItem {
    let collapsible = if !node.is_directory() {
        Collapsible::None
    } else if node.expanded {
        Collapsible::Expanded
    } else {
        Collapsible::Collapsed
    };

    let context = match node.role {
        NodeRole::Pipeline => ItemContext::Pipeline,
        NodeRole::ProcessGroup => ItemContext::ProcessGroup,
        NodeRole::ProcessFolder => ItemContext::ProcessFolder,
        _ if !node.is_directory() => ItemContext::File,
        _ if crate::tree::is_process_folder(node) => ItemContext::ProcessFolder,
        _ => ItemContext::Directory,
    };

    TreeItem {
        label: node.name.clone(),
        description: node.note.clone(),
        collapsible,
        context,
        tooltip: node.path().map(|p| p.display().to_string()),
    }
}

pub fn open_target(node: &Node) -> Option<OpenTarget> {
    let path = node.path.clone()?;
    if node.is_directory() {
        Some(OpenTarget::OpenTerminal(path))
    } else {
        Some(OpenTarget::ShowFile(path))
    }
}
