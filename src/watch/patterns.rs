// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::model::WatchBinding;

/// Compiled watch binding: a glob plus the ordered task names it triggers,
/// or a pure reload binding.
///
/// The pattern is relative to the project root; the watcher passes relative
/// paths (e.g. `"src/scss/style.scss"`) into `matches`.
#[derive(Clone)]
pub struct CompiledBinding {
    glob: String,
    set: GlobSet,
    tasks: Vec<String>,
    reload: bool,
}

impl fmt::Debug for CompiledBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBinding")
            .field("glob", &self.glob)
            .field("tasks", &self.tasks)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl CompiledBinding {
    /// The source pattern, for logging.
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Ordered task names to run when this binding fires.
    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    /// True if a match requests a full browser reload.
    pub fn reload(&self) -> bool {
        self.reload
    }

    /// Returns true if this binding is interested in the given path
    /// (relative to project root, forward slashes).
    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Compile every `[[watch]]` binding, preserving declaration order.
pub fn compile_bindings(bindings: &[WatchBinding]) -> Result<Vec<CompiledBinding>> {
    let mut compiled = Vec::with_capacity(bindings.len());

    for binding in bindings {
        let mut builder = GlobSetBuilder::new();
        // `*` must stop at path separators so `dist/*.html` only covers the
        // top level; only `**` recurses.
        let glob = GlobBuilder::new(&binding.glob)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid watch glob pattern: {}", binding.glob))?;
        builder.add(glob);

        compiled.push(CompiledBinding {
            glob: binding.glob.clone(),
            set: builder.build()?,
            tasks: binding.tasks.clone(),
            reload: binding.reload,
        });
    }

    Ok(compiled)
}
