// src/render.rs

//! Plain-text rendering of a provider's tree for the CLI.

use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;

use crate::provider::RunsProvider;
use crate::tree::Node;

/// Render every pipeline root (or just `only`) and all of its descendants.
pub async fn render_all(provider: &RunsProvider, only: Option<&str>) -> String {
    let mut out = String::new();
    for root in provider.get_children(None).await {
        if only.is_some_and(|name| name != root.name) {
            continue;
        }
        let _ = writeln!(out, "{}", label(&root));
        render_children(provider, &root, String::new(), &mut out).await;
    }
    out
}

fn render_children<'a>(
    provider: &'a RunsProvider,
    node: &'a Node,
    prefix: String,
    out: &'a mut String,
) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        let children = provider.get_children(Some(node)).await;
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            let last = i + 1 == count;
            let branch = if last { "└── " } else { "├── " };
            let _ = writeln!(out, "{prefix}{branch}{}", label(child));
            if child.is_directory() {
                let next = format!("{prefix}{}", if last { "    " } else { "│   " });
                render_children(provider, child, next, out).await;
            }
        }
    })
}

/// `name  note  (exit N)`, skipping whatever is absent.
pub fn label(node: &Node) -> String {
    let mut line = node.name.clone();
    if let Some(note) = node.note.as_deref().filter(|n| !n.is_empty()) {
        line.push_str("  ");
        line.push_str(note);
    }
    if let Some(code) = node.status {
        let _ = write!(line, "  (exit {code})");
    }
    line
}
