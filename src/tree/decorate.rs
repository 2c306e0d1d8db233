// src/tree/decorate.rs

//! Raw → presentation rewrite of a run folder.
//!
//! Three nested passes, each returning fresh nodes so the raw tree stays
//! untouched:
//! - run level: keep work folders and loose files, drop empty-handed folders,
//!   flatten every process folder up to the run and group by process name
//! - work level: decorate the process folders, pass everything else through
//! - process level: rename after the task label, attach the exit status

use tracing::debug;

use crate::fs::FileSystem;
use crate::tree::classify::{is_process_folder, is_work_folder};
use crate::tree::group::{group, FAILURE_GLYPH};
use crate::tree::node::{Node, NodeRole};
use crate::tree::sentinel::{self, is_failure};
use crate::tree::sort::sort_nodes;

/// Number of hash characters shown from the process folder name.
const HASH_PREFIX_LEN: usize = 6;

/// Decorate a run folder. Call only on nodes where `is_run_folder` holds.
pub fn decorate_run(fs: &dyn FileSystem, run: &Node) -> Node {
    let mut work_folders = Vec::new();
    let mut loose_files = Vec::new();

    for child in run.children() {
        if is_work_folder(child) {
            work_folders.push((child, decorate_work(fs, child)));
        } else if !child.is_directory() {
            loose_files.push(child.clone());
        }
    }

    let mut collapsed = Vec::new();
    for (raw_work, work) in &work_folders {
        let work_name = raw_work.file_name();
        for (raw_task, task) in raw_work.children().iter().zip(work.children()) {
            if !is_process_folder(raw_task) || raw_work.path.is_none() || raw_task.path.is_none() {
                continue;
            }
            collapsed.push(collapse(work_name, raw_task.file_name(), task));
        }
    }

    debug!(
        run = %run.name,
        work_folders = work_folders.len(),
        processes = collapsed.len(),
        files = loose_files.len(),
        "decorated run folder"
    );

    let mut children = group(collapsed);
    children.extend(loose_files);
    sort_nodes(&mut children);

    let mut decorated = Node::new(run.name.clone(), run.kind, run.path.clone(), run.owner.clone())
        .with_role(NodeRole::RunFolder)
        .with_modified(run.modified_ms)
        .with_children(children);
    decorated.note = run.note.clone();
    decorated
}

/// Decorate the process folders inside a work folder.
pub fn decorate_work(fs: &dyn FileSystem, work: &Node) -> Node {
    let children = work
        .children()
        .iter()
        .map(|child| {
            if is_process_folder(child) {
                decorate_process(fs, child)
            } else {
                child.clone()
            }
        })
        .collect();

    Node::new(work.name.clone(), work.kind, work.path.clone(), work.owner.clone())
        .with_role(NodeRole::WorkFolder)
        .with_modified(work.modified_ms)
        .with_children(children)
}

/// Rename a process folder after its task label and attach its exit status.
pub fn decorate_process(fs: &dyn FileSystem, process: &Node) -> Node {
    let found = sentinel::extract(fs, process);

    let mut decorated = Node::new(
        found.label.unwrap_or_else(|| process.name.clone()),
        process.kind,
        process.path.clone(),
        process.owner.clone(),
    )
    .with_role(NodeRole::ProcessFolder)
    .with_modified(process.modified_ms)
    .with_children(process.children().to_vec());

    if let Some(code) = found.exit_code {
        decorated.status = Some(code);
        if is_failure(code) {
            decorated.note = Some(FAILURE_GLYPH.to_string());
        }
    }
    decorated
}

/// A decorated process folder lifted to run level, tagged with the
/// `<work>/<hash prefix>` pair that locates it on disk.
fn collapse(work_name: &str, process_dir_name: &str, task: &Node) -> Node {
    let prefix: String = process_dir_name.chars().take(HASH_PREFIX_LEN).collect();
    let note = format!(
        "[{}/{}] {}",
        work_name,
        prefix,
        task.note.as_deref().unwrap_or("")
    );

    let mut node = Node::new(task.name.clone(), task.kind, task.path.clone(), task.owner.clone())
        .with_role(NodeRole::ProcessFolder)
        .with_modified(task.modified_ms)
        .with_children(task.children().to_vec());
    node.status = task.status;
    node.note = Some(note.trim_end().to_string());
    node
}
