// src/tree/classify.rs

//! Shape-only classification of directory nodes.
//!
//! The engine lays runs out as `run/<hash prefix>/<hash suffix>/`, but the
//! predicates below never look at names or depth beyond the one sentinel
//! file. Each answer is memoised on the node the first time it is asked.

use crate::tree::node::{Node, Tri, TriCell};

/// Name of the generated task script whose presence marks a process folder.
pub const COMMAND_RUN: &str = ".command.run";

/// A directory holding `.command.run` directly.
pub fn is_process_folder(node: &Node) -> bool {
    memoised(&node.classification().process, || {
        node.is_directory() && node.children().iter().any(|c| c.name == COMMAND_RUN)
    })
}

/// A directory with at least one process folder among its children.
pub fn is_work_folder(node: &Node) -> bool {
    memoised(&node.classification().work, || {
        node.is_directory() && node.children().iter().any(is_process_folder)
    })
}

/// A directory with at least one work folder among its children.
pub fn is_run_folder(node: &Node) -> bool {
    memoised(&node.classification().run, || {
        node.is_directory() && node.children().iter().any(is_work_folder)
    })
}

fn memoised(cell: &TriCell, compute: impl FnOnce() -> bool) -> bool {
    match cell.get() {
        Tri::Yes => true,
        Tri::No => false,
        Tri::Unknown => cell.resolve(compute()),
    }
}

/// Current memo state of the three predicates, `(run, work, process)`.
pub fn memo_state(node: &Node) -> (Tri, Tri, Tri) {
    let c = node.classification();
    (c.run.get(), c.work.get(), c.process.get())
}
