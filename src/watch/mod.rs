// src/watch/mod.rs

//! Turning filesystem activity under the storage roots into [`RunEvent`]s.
//!
//! The watcher does not know anything about trees; it only works out which
//! pipeline a changed path belongs to and tells the runtime loop whether
//! that pipeline's run started or was updated.
//!
//! [`RunEvent`]: crate::provider::RunEvent

pub mod event_map;
pub mod watcher;

pub use event_map::{events_for, is_relevant, is_run_start};
pub use watcher::{spawn_watcher, WatcherHandle};
