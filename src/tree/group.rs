// src/tree/group.rs

//! Clustering of decorated process nodes by process name.
//!
//! The engine labels tasks `processName (tag)`; every node whose name ends in
//! `)` is filed under the text before its last `(`.

use std::collections::HashMap;

use tracing::debug;

use crate::fs::EntryKind;
use crate::tree::node::{Node, NodeRole};
use crate::tree::sentinel::{is_failure, is_success};

pub const FAILURE_GLYPH: &str = "\u{274C}";

/// Group key for a node name, or `None` if the name is not groupable.
pub fn group_key(name: &str) -> Option<&str> {
    if !name.ends_with(')') {
        return None;
    }
    let open = name.rfind('(')?;
    Some(name[..open].trim())
}

/// Success/failure tally over the members that belong to the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupTally {
    pub success: usize,
    pub failure: usize,
}

/// Count members whose folder was touched at or after the owning pipeline's
/// run start. Older members (left over from a resumed run) count as neither.
pub fn tally(members: &[Node]) -> GroupTally {
    let mut tally = GroupTally::default();
    for member in members {
        if member.path.is_none() {
            continue;
        }
        let started = member.owner.run_started_at_ms();
        let current = member.modified_ms.is_some_and(|ms| ms >= started);
        if !current {
            continue;
        }
        match member.status {
            Some(code) if is_success(code) => tally.success += 1,
            Some(code) if is_failure(code) => tally.failure += 1,
            _ => {}
        }
    }
    tally
}

/// Replace groupable nodes with one synthetic directory per process name.
///
/// Non-groupable nodes pass through untouched, ahead of the groups. Groups
/// appear in first-seen order and keep their members in input order.
pub fn group(nodes: Vec<Node>) -> Vec<Node> {
    let mut result = Vec::with_capacity(nodes.len());
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<Node>> = HashMap::new();

    for node in nodes {
        match group_key(&node.name) {
            Some(key) => {
                let key = key.to_string();
                if !buckets.contains_key(&key) {
                    order.push(key.clone());
                }
                buckets.entry(key).or_default().push(node);
            }
            None => result.push(node),
        }
    }

    for key in order {
        let Some(members) = buckets.remove(&key) else {
            continue;
        };
        let Some(owner) = members.first().map(|m| m.owner.clone()) else {
            continue;
        };
        let counts = tally(&members);
        debug!(
            process = %key,
            members = members.len(),
            success = counts.success,
            failure = counts.failure,
            "grouped process nodes"
        );

        let mut group = Node::new(key, EntryKind::Directory, None, owner)
            .with_role(NodeRole::ProcessGroup)
            .with_children(members);
        group.expanded = true;
        if counts.failure > 0 {
            group.note = Some(FAILURE_GLYPH.to_string());
        }
        result.push(group);
    }

    result
}
