// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::patterns::CompiledBinding;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes the given `root` directory
/// recursively and sends a runtime event for every binding a changed path
/// matches.
///
/// - `root` is the project root against which all glob patterns are evaluated.
/// - `bindings` is the compiled binding list, in declaration order.
/// - `runtime_tx` is the channel into the main runtime; it is the single
///   dispatch queue, so each change event is handled to completion before
///   the next one.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<CompiledBinding>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    let bindings = Arc::new(bindings);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        {
            let event_tx = event_tx.clone();
            move |res: notify::Result<Event>| {
                match res {
                    Ok(event) => {
                        if !is_content_change(&event.kind) {
                            return;
                        }
                        if let Err(err) = event_tx.send(event) {
                            // We can't log via tracing here easily, so fallback to stderr.
                            eprintln!("sitepipe: failed to forward notify event: {err}");
                        }
                    }
                    Err(err) => {
                        eprintln!("sitepipe: file watch error: {err}");
                    }
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    // Async task that consumes notify events and forwards binding triggers
    // to the runtime.
    let async_root = root.clone();
    let async_bindings = Arc::clone(&bindings);
    tokio::spawn(async move {
        let runtime_tx = runtime_tx;

        while let Some(event) = event_rx.recv().await {
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let Some(rel_str) = relative_str(&async_root, path) else {
                    warn!(
                        "could not relativize path {:?} against root {:?}",
                        path, async_root
                    );
                    continue;
                };

                for binding in async_bindings.iter() {
                    if !binding.matches(&rel_str) {
                        continue;
                    }

                    let event = if binding.reload() {
                        debug!(glob = %binding.glob(), path = %rel_str, "watch match -> reload");
                        RuntimeEvent::ReloadRequested {
                            path: rel_str.clone(),
                        }
                    } else {
                        debug!(
                            glob = %binding.glob(),
                            path = %rel_str,
                            tasks = ?binding.tasks(),
                            "watch match -> triggering tasks"
                        );
                        RuntimeEvent::TasksTriggered {
                            tasks: binding.tasks().to_vec(),
                            path: rel_str.clone(),
                        }
                    };

                    if let Err(err) = runtime_tx.send(event).await {
                        warn!("failed to send runtime event: {err}");
                        // If the runtime channel is closed, there's no point
                        // keeping the watcher loop alive.
                        return;
                    }
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Only data-level changes are interesting; metadata churn would retrigger
/// tasks for nothing.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Data(_))
    ) || matches!(kind, EventKind::Modify(ModifyKind::Any))
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root` and cannot be relativized.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
