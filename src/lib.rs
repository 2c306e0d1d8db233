// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod provider;
pub mod render;
pub mod tree;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::model::ConfigFile;
use crate::errors::RunlensError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::provider::{PipelineRegistry, ProviderOptions, RunEvent, RunsProvider};
use crate::tree::TreeBuilder;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the pipeline registry, tree builder and provider
/// - one render pass
/// - (optional) file watcher + re-render loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    if let Some(name) = args.pipeline.as_deref() {
        if !cfg.pipeline.contains_key(name) {
            return Err(RunlensError::PipelineNotFound(name.to_string()).into());
        }
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let provider = Arc::new(build_provider(&cfg, !args.raw)?);
    let only = args.pipeline.as_deref();

    print!("{}", render::render_all(&provider, only).await);

    if !args.watch {
        return Ok(());
    }

    let (rt_tx, mut rt_rx) = mpsc::channel::<RunEvent>(64);
    let _watcher_handle = watch::spawn_watcher(PipelineRegistry::from_config(&cfg), rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = stop_tx.send(()).await;
    });

    info!("watching run folders; press Ctrl-C to stop");
    loop {
        let first = tokio::select! {
            event = rt_rx.recv() => event,
            _ = stop_rx.recv() => None,
        };
        let Some(first) = first else {
            break;
        };

        // Coalesce whatever piled up while we were rendering.
        let mut touched = vec![first];
        while let Ok(event) = rt_rx.try_recv() {
            touched.push(event);
        }
        for event in touched.iter() {
            provider.handle_event(event);
        }
        if only.is_some_and(|name| touched.iter().all(|e| e.pipeline() != name)) {
            continue;
        }

        debug!(events = touched.len(), "re-rendering after filesystem changes");
        println!();
        print!("{}", render::render_all(&provider, only).await);
    }

    info!("runlens exiting");
    Ok(())
}

/// Build a provider over the real filesystem from a validated config.
pub fn build_provider(cfg: &ConfigFile, decorated: bool) -> Result<RunsProvider> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let builder = TreeBuilder::new(fs).with_hidden_patterns(&cfg.config.hide)?;
    let registry = PipelineRegistry::from_config(cfg);
    let options = ProviderOptions {
        decorated: decorated && cfg.config.decorated,
    };
    Ok(RunsProvider::new(builder, registry, options))
}

/// Simple dry-run output: print the resolved pipelines.
fn print_dry_run(cfg: &ConfigFile) {
    println!("runlens dry-run");
    println!("  config.storage_path = {}", cfg.config.storage_path);
    println!("  config.decorated = {}", cfg.config.decorated);
    if !cfg.config.hide.is_empty() {
        println!("  config.hide = {:?}", cfg.config.hide);
    }
    println!();

    println!("pipelines ({}):", cfg.pipeline.len());
    for (name, storage) in cfg.pipeline_storage_paths() {
        println!("  - {name}");
        println!("      folder: {}", storage.join(&name).display());
    }

    debug!("dry-run complete (nothing walked)");
}
