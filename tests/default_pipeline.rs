use std::error::Error;
use std::path::Path;

use sitepipe::cli::LogLevel;
use sitepipe::config::{build_order, default_config, load_and_validate, validate_config};
use sitepipe::logging::directive;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn built_in_default_pipeline_parses_and_validates() -> TestResult {
    let cfg = default_config()?;
    validate_config(&cfg)?;

    for name in ["html", "css", "scss", "js", "imagemin", "typescript"] {
        assert!(cfg.task.contains_key(name), "missing default task {name}");
    }

    Ok(())
}

#[test]
fn missing_config_file_falls_back_to_defaults() -> TestResult {
    let cfg = load_and_validate(Path::new("definitely-does-not-exist.toml"))?;
    assert!(cfg.task.contains_key("html"));
    assert_eq!(cfg.serve.port, 3000);
    assert_eq!(cfg.serve.root, "dist");
    assert_eq!(cfg.build.partial_prefix, "_");
    Ok(())
}

#[test]
fn full_build_orders_minified_css_after_expanded_css() -> TestResult {
    let cfg = default_config()?;
    let order = build_order(&cfg);

    let css = order.iter().position(|n| n == "css").expect("css in order");
    let scss = order
        .iter()
        .position(|n| n == "scss")
        .expect("scss in order");
    assert!(css < scss, "css must build before scss, got {order:?}");
    assert_eq!(order.len(), cfg.task.len());

    Ok(())
}

#[test]
fn default_watch_bindings_cover_sources_and_outputs() -> TestResult {
    let cfg = default_config()?;

    let scss = cfg
        .watch
        .iter()
        .find(|b| b.glob.starts_with("src/scss"))
        .expect("scss binding");
    assert_eq!(scss.tasks, vec!["css".to_string(), "scss".to_string()]);

    let html_reload = cfg
        .watch
        .iter()
        .find(|b| b.glob == "dist/*.html")
        .expect("html reload binding");
    assert!(html_reload.reload);
    assert!(html_reload.tasks.is_empty());

    Ok(())
}

#[test]
fn unknown_task_reference_in_binding_is_rejected() -> TestResult {
    let toml = r#"
        [task.css]
        src = ["src/scss/**/*.scss"]
        dest = "dist/css"
        steps = [{ kind = "sass" }]

        [[watch]]
        glob = "src/scss/**/*.scss"
        tasks = ["nope"]
    "#;
    let cfg: sitepipe::config::ConfigFile = toml::from_str(toml)?;
    assert!(validate_config(&cfg).is_err());
    Ok(())
}

#[test]
fn cli_log_levels_map_to_filter_directives() {
    assert_eq!(directive(LogLevel::Error), "error");
    assert_eq!(directive(LogLevel::Warn), "warn");
    assert_eq!(directive(LogLevel::Info), "info");
    assert_eq!(directive(LogLevel::Debug), "debug");
    assert_eq!(directive(LogLevel::Trace), "trace");
}

#[test]
fn build_order_cycle_is_rejected() -> TestResult {
    let toml = r#"
        [task.a]
        src = ["src/**/*.x"]
        dest = "dist"
        steps = [{ kind = "html-clean" }]
        after = ["b"]

        [task.b]
        src = ["src/**/*.y"]
        dest = "dist"
        steps = [{ kind = "html-clean" }]
        after = ["a"]
    "#;
    let cfg: sitepipe::config::ConfigFile = toml::from_str(toml)?;
    assert!(validate_config(&cfg).is_err());
    Ok(())
}
