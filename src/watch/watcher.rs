// src/watch/watcher.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::provider::{PipelineRegistry, RunEvent};
use crate::watch::event_map::{events_for, is_relevant};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl WatcherHandle {
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish()
    }
}

/// Spawn a recursive watcher over every storage root in `registry` and send
/// `RunEvent::Updated` for each pipeline whose folder sees a change, or
/// `RunEvent::Started` when a run folder gets a fresh engine log.
///
/// Storage roots that do not exist yet are skipped with a warning.
pub fn spawn_watcher(
    registry: PipelineRegistry,
    runtime_tx: mpsc::Sender<RunEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        {
            let event_tx = event_tx.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        eprintln!("runlens: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("runlens: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    let roots: BTreeSet<PathBuf> = registry
        .iter()
        .map(|ctx| ctx.storage_root().to_path_buf())
        .collect();
    let mut watched = Vec::new();
    for root in roots {
        if !root.is_dir() {
            warn!(root = ?root, "storage root missing; not watching it");
            continue;
        }
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("file watcher started on {:?}", root);
        watched.push(root);
    }

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_relevant(&event.kind) {
                continue;
            }
            debug!(?event, "received notify event");
            for run_event in events_for(&registry, &event.kind, &event.paths) {
                if let Err(err) = runtime_tx.send(run_event).await {
                    warn!("failed to send RunEvent: {err}");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        roots: watched,
    })
}
