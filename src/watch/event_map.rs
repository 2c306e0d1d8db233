// src/watch/event_map.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use notify::EventKind;

use crate::provider::{PipelineRegistry, RunEvent};
use crate::tree::sentinel::ENGINE_LOG;

/// Access-only events (reads, opens) never change what the tree shows.
pub fn is_relevant(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

/// The engine creates a fresh `.nextflow.log` in the run folder each time a
/// run starts or resumes (the previous one is rotated away).
pub fn is_run_start(kind: &EventKind, path: &Path) -> bool {
    matches!(kind, EventKind::Create(_))
        && path.file_name().is_some_and(|name| name == ENGINE_LOG)
}

/// One event per pipeline touched by `paths`, in name order.
///
/// A pipeline whose engine log was just created gets `Started`, any other
/// touched pipeline gets `Updated`.
pub fn events_for(registry: &PipelineRegistry, kind: &EventKind, paths: &[PathBuf]) -> Vec<RunEvent> {
    let mut touched: BTreeMap<String, bool> = BTreeMap::new();
    for path in paths {
        let Some(ctx) = registry.owner_of(path) else {
            continue;
        };
        let started = touched.entry(ctx.name().to_string()).or_default();
        *started |= is_run_start(kind, path);
    }

    touched
        .into_iter()
        .map(|(pipeline, started)| {
            if started {
                RunEvent::Started { pipeline }
            } else {
                RunEvent::Updated { pipeline }
            }
        })
        .collect()
}
