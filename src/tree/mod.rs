// src/tree/mod.rs

//! Run-directory model: building, classifying and decorating.
//!
//! This module is responsible for:
//! - Walking a pipeline's storage folder into a raw [`Node`] tree.
//! - Recognising run / work / process folders purely from their shape.
//! - Reading task labels and exit codes out of the engine's sentinel files.
//! - Rewriting a run folder into the grouped, sorted presentation tree.
//!
//! It does **not** cache anything or know which pipelines exist; that is the
//! provider's job.

pub mod builder;
pub mod classify;
pub mod decorate;
pub mod group;
pub mod node;
pub mod sentinel;
pub mod sort;

pub use builder::{TreeBuilder, RESERVED_NAMES};
pub use classify::{is_process_folder, is_run_folder, is_work_folder};
pub use decorate::{decorate_process, decorate_run, decorate_work};
pub use group::{group, group_key, tally, GroupTally, FAILURE_GLYPH};
pub use node::{EntryKind, Node, NodeRole, Tri};
pub use sentinel::{extract, Sentinels};
pub use sort::sort_nodes;
