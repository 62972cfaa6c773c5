use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use sitepipe::config::ConfigFile;
use sitepipe::engine::{Runtime, RuntimeEvent};
use sitepipe::pipeline::Registry;
use sitepipe::serve::{ReloadMessage, ServerState};

type TestResult = Result<(), Box<dyn Error>>;

const CONFIG: &str = r#"
[task.css]
src = ["src/scss/**/*.scss"]
dest = "dist/css"
steps = [{ kind = "sass" }]
rename = { ext = ".css" }

[task.scss]
src = ["src/scss/**/*.scss"]
dest = "dist/css"
after = ["css"]
stream = true
steps = [{ kind = "sass" }, { kind = "css-minify" }]
rename = { ext = ".css", suffix = ".min" }
"#;

fn write_tree(root: &Path) -> TestResult {
    let scss = root.join("src/scss");
    fs::create_dir_all(&scss)?;
    fs::write(scss.join("style.scss"), "body {\n  margin: 0;\n}\n")?;
    Ok(())
}

#[tokio::test]
async fn change_event_runs_bound_tasks_once_in_order() -> TestResult {
    let tmp = tempfile::tempdir()?;
    write_tree(tmp.path())?;

    let cfg: ConfigFile = toml::from_str(CONFIG)?;
    sitepipe::config::validate_config(&cfg)?;
    let registry = Registry::from_config(&cfg, tmp.path())?;

    let state = Arc::new(ServerState::new());
    let mut reload_rx = state.reload_tx.subscribe();

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(8);
    let runtime = Runtime::new(registry, Arc::clone(&state), tmp.path().join("dist"), rx);
    let handle = tokio::spawn(runtime.run());

    // One change event to a bound source: both bound tasks run, once each.
    tx.send(RuntimeEvent::TasksTriggered {
        tasks: vec!["css".into(), "scss".into()],
        path: "src/scss/style.scss".into(),
    })
    .await?;

    // An output binding fired: full reload.
    tx.send(RuntimeEvent::ReloadRequested {
        path: "dist/index.html".into(),
    })
    .await?;

    tx.send(RuntimeEvent::ShutdownRequested).await?;
    handle.await??;

    assert!(tmp.path().join("dist/css/style.css").is_file());
    assert!(tmp.path().join("dist/css/style.min.css").is_file());

    // The streaming task pushed its written assets, then the reload binding
    // requested a full reload; events were handled strictly in order.
    match reload_rx.try_recv()? {
        ReloadMessage::Assets(assets) => {
            assert_eq!(assets, vec!["css/style.min.css".to_string()]);
        }
        other => panic!("expected asset update first, got {other:?}"),
    }
    assert_eq!(reload_rx.try_recv()?, ReloadMessage::Reload);
    assert!(reload_rx.try_recv().is_err(), "exactly one run per event");

    Ok(())
}

#[tokio::test]
async fn failed_task_run_keeps_the_session_alive() -> TestResult {
    let tmp = tempfile::tempdir()?;
    write_tree(tmp.path())?;

    let cfg: ConfigFile = toml::from_str(CONFIG)?;
    let registry = Registry::from_config(&cfg, tmp.path())?;

    let state = Arc::new(ServerState::new());
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(8);
    let runtime = Runtime::new(registry, Arc::clone(&state), tmp.path().join("dist"), rx);
    let handle = tokio::spawn(runtime.run());

    // A trigger naming an unknown task is logged, not fatal.
    tx.send(RuntimeEvent::TasksTriggered {
        tasks: vec!["nope".into(), "css".into()],
        path: "src/scss/style.scss".into(),
    })
    .await?;
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    handle.await??;

    // The known task that followed still ran.
    assert!(tmp.path().join("dist/css/style.css").is_file());

    Ok(())
}
