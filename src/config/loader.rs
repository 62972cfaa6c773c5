// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;

/// Built-in default pipeline, used when no config file is present.
///
/// This is the classic static-site layout: templates under `src/ejs`,
/// stylesheets under `src/scss`, scripts under `src/js`, images under
/// `src/img`, typed scripts under `src/ts`, everything built into `dist`.
const DEFAULT_CONFIG: &str = r#"
[task.html]
src = ["src/ejs/**/*.ejs"]
exclude = ["src/ejs/**/_*.ejs"]
dest = "dist"
steps = [{ kind = "render" }, { kind = "html-clean" }]
rename = { ext = ".html" }

[task.css]
src = ["src/scss/**/*.scss"]
exclude = ["src/scss/**/_*.scss"]
dest = "dist/css"
steps = [{ kind = "sass", style = "expanded" }]
rename = { ext = ".css" }

[task.scss]
src = ["src/scss/**/*.scss"]
exclude = ["src/scss/**/_*.scss"]
dest = "dist/css"
after = ["css"]
stream = true
steps = [{ kind = "sass", style = "expanded" }, { kind = "css-minify" }]
rename = { ext = ".css", suffix = ".min" }

[task.js]
src = ["src/js/**/*.js"]
exclude = ["src/js/**/_*.js"]
dest = "dist/js"
steps = [{ kind = "exec", cmd = "esbuild --loader=js --target=es2015" }]

[task.imagemin]
src = ["src/img/*.{jpg,jpeg,png,gif,svg}"]
dest = "dist/img"
stream = true
steps = [{ kind = "image", jpeg_quality = 80 }]

[task.typescript]
src = ["src/ts/**/*.ts"]
exclude = ["src/ts/**/_*.ts"]
dest = "dist/ts"
steps = [{ kind = "exec", cmd = "esbuild --loader=ts --target=es2015" }]
rename = { ext = ".js" }

[[watch]]
glob = "src/ejs/**/*.ejs"
tasks = ["html"]

[[watch]]
glob = "src/scss/**/*.scss"
tasks = ["css", "scss"]

[[watch]]
glob = "src/js/**/*.js"
tasks = ["js"]

[[watch]]
glob = "src/img/**/*.{jpg,jpeg,png,gif,svg}"
tasks = ["imagemin"]

[[watch]]
glob = "src/ts/**/*.ts"
tasks = ["typescript"]

[[watch]]
glob = "dist/*.html"
reload = true

[[watch]]
glob = "dist/js/*.js"
reload = true
"#;

/// Parse the built-in default configuration.
pub fn default_config() -> Result<ConfigFile> {
    let config: ConfigFile =
        toml::from_str(DEFAULT_CONFIG).context("parsing built-in default config")?;
    Ok(config)
}

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (task references, build order, etc.). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading config file at {path:?}"))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {path:?}"))?;

    Ok(config)
}

/// Load a configuration and run basic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML from `path`, or uses the built-in default pipeline when the
///   file does not exist.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - unknown task references in watch bindings and `after`,
///   - build-order cycles,
///   - invalid glob patterns.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();

    let config = if path.exists() {
        load_from_path(path)?
    } else {
        info!("no config file at {path:?}; using built-in default pipeline");
        default_config()?
    };

    validate_config(&config)?;
    Ok(config)
}
