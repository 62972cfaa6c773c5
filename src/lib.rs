// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeEvent};
use crate::pipeline::registry::{Registry, RunReport};
use crate::serve::{ServerState, create_router, inject_livereload_into_dir};
use crate::watch::compile_bindings;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task registry
/// - direct task invocation / one-shot full builds
/// - dev server + reload notifier
/// - file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    let registry = Registry::from_config(&cfg, &root)?;

    // Direct task invocation: run the named tasks once, in the given order.
    if !args.tasks.is_empty() {
        for name in &args.tasks {
            let report = registry.run(name)?;
            log_report(&report);
        }
        return Ok(());
    }

    // Full build, dependency-ordered.
    info!("running initial full build");
    for report in registry.run_all()? {
        log_report(&report);
    }

    if args.once {
        return Ok(());
    }

    // Reload notifier + dev server.
    let state = Arc::new(ServerState::new());
    let serve_root = root.join(&cfg.serve.root);
    inject_livereload_into_dir(&serve_root)?;

    let port = args.port.unwrap_or(cfg.serve.port);
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("binding dev server to 127.0.0.1:{port}"))?;
    let router = create_router(&serve_root, &cfg.serve.index, Arc::clone(&state));

    info!("dev server running at http://127.0.0.1:{port}");
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!(error = %err, "dev server stopped");
        }
    });

    if args.open {
        let _ = open::that(format!("http://127.0.0.1:{port}"));
    }

    // Runtime event channel: the single dispatch queue.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // File watcher.
    let bindings = compile_bindings(&cfg.watch)?;
    let _watcher_handle = watch::spawn_watcher(root.clone(), bindings, rt_tx.clone())?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runtime = Runtime::new(registry, Arc::clone(&state), serve_root, rt_rx);
    runtime.run().await
}

/// Figure out a sensible project root for building and watching.
/// Currently: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from("."),
    }
}

fn log_report(report: &RunReport) {
    if report.failed > 0 {
        info!(
            task = %report.task,
            written = report.written.len(),
            failed = report.failed,
            "task finished with per-file failures"
        );
    } else {
        debug!(task = %report.task, written = report.written.len(), "task finished");
    }
}

/// Simple dry-run output: print tasks, pipelines and watch bindings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("sitepipe dry-run");
    println!(
        "  serve: http://127.0.0.1:{} (root: {})",
        cfg.serve.port, cfg.serve.root
    );
    println!("  partial prefix: {:?}", cfg.build.partial_prefix);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      src: {:?}", task.src);
        if !task.exclude.is_empty() {
            println!("      exclude: {:?}", task.exclude);
        }
        println!("      dest: {}", task.dest);
        let steps: Vec<&str> = task
            .steps
            .iter()
            .map(|s| match s {
                config::model::StepConfig::Render => "render",
                config::model::StepConfig::Sass { .. } => "sass",
                config::model::StepConfig::CssMinify => "css-minify",
                config::model::StepConfig::HtmlClean { .. } => "html-clean",
                config::model::StepConfig::Image { .. } => "image",
                config::model::StepConfig::Exec { .. } => "exec",
            })
            .collect();
        println!("      steps: {steps:?}");
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if task.stream {
            println!("      stream: true");
        }
    }

    println!();
    println!("watch bindings ({}):", cfg.watch.len());
    for binding in cfg.watch.iter() {
        if binding.reload {
            println!("  - {} -> reload", binding.glob);
        } else {
            println!("  - {} -> {:?}", binding.glob, binding.tasks);
        }
    }

    debug!("dry-run complete (no execution)");
}
