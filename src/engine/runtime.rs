// src/engine/runtime.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::pipeline::registry::{Registry, RunReport};
use crate::serve::{ServerState, inject_livereload};

/// Events sent into the runtime from the watcher or external signals.
///
/// The idea is that:
/// - the watcher sends `TasksTriggered` for source bindings
/// - the watcher sends `ReloadRequested` for output (reload) bindings
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TasksTriggered { tasks: Vec<String>, path: String },
    ReloadRequested { path: String },
    ShutdownRequested,
}

/// The dispatch runtime.
///
/// Responsibilities:
/// - Consume `RuntimeEvent`s from the watcher / Ctrl-C handler.
/// - Run the bound tasks, in declaration order, to completion. The event
///   channel itself is the dispatch queue: a change that arrives while a
///   pipeline runs simply queues behind it.
/// - Signal the reload notifier after runs that asked for it.
pub struct Runtime {
    registry: Registry,
    reload: Arc<ServerState>,
    /// Directory served by the dev server; asset URLs pushed over the
    /// reload channel are relative to it.
    serve_root: PathBuf,

    /// Unified event stream from all producers.
    events_rx: mpsc::Receiver<RuntimeEvent>,
}

impl Runtime {
    pub fn new(
        registry: Registry,
        reload: Arc<ServerState>,
        serve_root: PathBuf,
        events_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            registry,
            reload,
            serve_root,
            events_rx,
        }
    }

    /// Main event loop.
    ///
    /// This should be called from `lib.rs` after:
    /// - config is loaded & validated and the `Registry` is built
    /// - the initial full build has run
    /// - watcher, dev server and Ctrl-C handler have been spawned with a
    ///   clone of the `mpsc::Sender<RuntimeEvent>`
    pub async fn run(mut self) -> Result<()> {
        info!("sitepipe runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::TasksTriggered { tasks, path } => {
                    self.handle_tasks_triggered(&tasks, &path);
                }
                RuntimeEvent::ReloadRequested { path } => {
                    debug!(path = %path, "output changed; requesting full reload");
                    self.reload.notify_reload();
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping runtime");
                    break;
                }
            }
        }

        info!("sitepipe runtime exiting");
        Ok(())
    }

    /// Run the bound tasks for one change event, in declaration order.
    ///
    /// A failing run is logged and does not stop the remaining tasks or the
    /// watch session ("never crash the dev server").
    fn handle_tasks_triggered(&self, tasks: &[String], path: &str) {
        info!(path = %path, ?tasks, "source changed; running bound tasks");

        for name in tasks {
            match self.registry.run(name) {
                Ok(report) => self.after_run(name, &report),
                Err(err) => {
                    error!(task = %name, error = %err, "task run failed; continuing watch session");
                }
            }
        }
    }

    /// Post-run bookkeeping: keep served HTML reload-capable and push
    /// granular updates for streaming tasks.
    fn after_run(&self, name: &str, report: &RunReport) {
        for out in &report.written {
            if out.extension().is_some_and(|ext| ext == "html")
                && let Err(err) = inject_livereload(out)
            {
                warn!(path = ?out, error = %err, "failed to inject livereload script");
            }
        }

        let streams = self
            .registry
            .task(name)
            .map(|t| t.streams())
            .unwrap_or(false);
        if streams {
            let assets: Vec<String> = report
                .written
                .iter()
                .filter_map(|p| p.strip_prefix(&self.serve_root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .collect();
            debug!(task = %name, ?assets, "streaming asset update");
            self.reload.notify_assets(assets);
        }
    }
}
