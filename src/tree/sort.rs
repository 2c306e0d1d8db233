// src/tree/sort.rs

use std::cmp::Ordering;

use crate::tree::node::Node;

/// Directories first, then files; by name within each kind.
pub fn compare(a: &Node, b: &Node) -> Ordering {
    match (a.is_directory(), b.is_directory()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    }
}

pub fn sort_nodes(nodes: &mut [Node]) {
    nodes.sort_by(compare);
}
