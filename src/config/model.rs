// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [serve]
/// port = 3000
/// root = "dist"
///
/// [task.css]
/// src = ["src/scss/**/*.scss"]
/// dest = "dist/css"
/// steps = [{ kind = "sass" }]
/// rename = { ext = ".css" }
///
/// [[watch]]
/// glob = "src/scss/**/*.scss"
/// tasks = ["css", "scss"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Dev-server settings from `[serve]`.
    #[serde(default)]
    pub serve: ServeSection,

    /// Source-tree conventions from `[build]`.
    #[serde(default)]
    pub build: BuildSection,

    /// All tasks from `[task.<name>]`.
    ///
    /// Keys are the *task names* (e.g. `"css"`, `"html"`).
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Watch bindings from `[[watch]]`, in declaration order.
    #[serde(default)]
    pub watch: Vec<WatchBinding>,
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    /// Port the dev server binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served as the site root, also the reference point for
    /// asset URLs pushed over the reload channel.
    #[serde(default = "default_serve_root")]
    pub root: String,

    /// Index file served for `/`.
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_port() -> u16 {
    3000
}

fn default_serve_root() -> String {
    "dist".to_string()
}

fn default_index() -> String {
    "index.html".to_string()
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            root: default_serve_root(),
            index: default_index(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// File-name prefix marking a source as a partial (included by other
    /// sources, never built standalone).
    #[serde(default = "default_partial_prefix")]
    pub partial_prefix: String,
}

fn default_partial_prefix() -> String {
    "_".to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            partial_prefix: default_partial_prefix(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Include glob patterns selecting source files, relative to the
    /// project root.
    pub src: Vec<String>,

    /// Exclude glob patterns; matched files are skipped.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Destination directory, relative to the project root.
    pub dest: String,

    /// Ordered pipeline of transformation steps.
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Output renaming applied after all steps ran.
    #[serde(default)]
    pub rename: Option<RenameRule>,

    /// Tasks that must run before this one in a full build.
    ///
    /// This only orders full builds; watch bindings carry their own ordered
    /// task lists.
    #[serde(default)]
    pub after: Vec<String>,

    /// If true, completed runs push the written output paths over the
    /// reload channel instead of requesting a full page reload.
    #[serde(default)]
    pub stream: bool,
}

/// Output renaming rule, e.g. `{ ext = ".html" }` or
/// `{ ext = ".css", suffix = ".min" }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenameRule {
    /// Replacement file extension, with or without the leading dot.
    #[serde(default)]
    pub ext: Option<String>,

    /// Suffix inserted between the file stem and the extension.
    #[serde(default)]
    pub suffix: Option<String>,
}

/// One pipeline step, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepConfig {
    /// Render the file as a template (the whole task source tree is loaded
    /// so partials can be included).
    Render,

    /// Compile SCSS to CSS.
    Sass {
        #[serde(default)]
        style: SassStyle,
    },

    /// Minify CSS.
    CssMinify,

    /// Strip HTML comments and anything before the doctype.
    HtmlClean {
        #[serde(default = "default_true")]
        remove_comments: bool,
    },

    /// Recompress raster images; unknown formats pass through unchanged.
    Image {
        #[serde(default = "default_jpeg_quality")]
        jpeg_quality: u8,
    },

    /// Pipe the file through an external command (stdin -> stdout).
    Exec { cmd: String },
}

fn default_true() -> bool {
    true
}

fn default_jpeg_quality() -> u8 {
    80
}

/// CSS output style for the `sass` step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SassStyle {
    #[default]
    Expanded,
    Compressed,
}

/// `[[watch]]` entry: a source glob bound to an ordered list of task names,
/// or a pure reload binding on output files.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchBinding {
    /// Glob pattern, relative to the project root.
    pub glob: String,

    /// Tasks to run, in order, when a matching path changes.
    #[serde(default)]
    pub tasks: Vec<String>,

    /// If true, a matching change requests a full browser reload.
    #[serde(default)]
    pub reload: bool,
}
