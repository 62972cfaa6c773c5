// src/pipeline/registry.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::model::{ConfigFile, RenameRule, StepConfig, TaskConfig};
use crate::config::validate::build_order;
use crate::pipeline::step::{Asset, Step, StepPaths, slash_path};

/// One compiled `src` pattern: the matcher plus the static prefix its
/// matches are relativized against.
#[derive(Debug)]
struct SourceGlob {
    matcher: GlobMatcher,
    base: PathBuf,
}

/// One compiled task: selectors, destination and step recipe.
///
/// Steps themselves are compiled fresh at the start of every run (see
/// [`Step::compile`]); the task only keeps the declarative recipe.
#[derive(Debug)]
pub struct Task {
    name: String,
    /// One entry per `src` pattern; a matched file is relativized against
    /// the base of the pattern that selected it.
    sources: Vec<SourceGlob>,
    exclude: Option<GlobSet>,
    dest: PathBuf,
    steps: Vec<StepConfig>,
    rename: Option<RenameRule>,
    stream: bool,
}

impl Task {
    fn from_config(name: &str, cfg: &TaskConfig) -> Result<Self> {
        if cfg.src.is_empty() {
            return Err(anyhow!("task '{name}' has no `src` patterns"));
        }

        let mut sources = Vec::with_capacity(cfg.src.len());
        for pat in &cfg.src {
            // `*` must stop at path separators; only `**` recurses.
            let glob = GlobBuilder::new(pat)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid glob pattern '{pat}' in task {name}"))?;
            sources.push(SourceGlob {
                matcher: glob.compile_matcher(),
                base: glob_base(pat),
            });
        }

        let exclude = if cfg.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(&cfg.exclude)
                    .with_context(|| format!("building exclude globset for task {name}"))?,
            )
        };

        Ok(Self {
            name: name.to_string(),
            sources,
            exclude,
            dest: PathBuf::from(&cfg.dest),
            steps: cfg.steps.clone(),
            rename: cfg.rename.clone(),
            stream: cfg.stream,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether completed runs push granular asset updates over the reload
    /// channel instead of a full page reload.
    pub fn streams(&self) -> bool {
        self.stream
    }

    /// The source glob that selects the given path (relative to the project
    /// root, forward slashes), if any.
    fn selects(&self, rel_path: &str) -> Option<&SourceGlob> {
        if let Some(exclude) = &self.exclude
            && exclude.is_match(rel_path)
        {
            return None;
        }
        self.sources.iter().find(|s| s.matcher.is_match(rel_path))
    }
}

/// Result of one task run.
#[derive(Debug)]
pub struct RunReport {
    pub task: String,
    /// Output files written, as paths under the project root.
    pub written: Vec<PathBuf>,
    /// Number of source files whose transformation failed (logged, skipped).
    pub failed: usize,
    pub duration: Duration,
}

/// The task registry: every task from the config, compiled, plus the
/// dependency-ordered full-build sequence.
///
/// This is an explicitly constructed object scoped to one run/serve
/// invocation; there is no ambient process-wide task state.
#[derive(Debug)]
pub struct Registry {
    root: PathBuf,
    partial_prefix: String,
    tasks: BTreeMap<String, Task>,
    order: Vec<String>,
}

impl Registry {
    /// Compile all tasks from a validated [`ConfigFile`].
    ///
    /// `root` is the project root all globs and destinations resolve
    /// against.
    pub fn from_config(cfg: &ConfigFile, root: &Path) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for (name, tc) in cfg.task.iter() {
            tasks.insert(name.clone(), Task::from_config(name, tc)?);
        }

        Ok(Self {
            root: root.to_path_buf(),
            partial_prefix: cfg.build.partial_prefix.clone(),
            tasks,
            order: build_order(cfg),
        })
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Run every task once, in dependency order.
    pub fn run_all(&self) -> Result<Vec<RunReport>> {
        let mut reports = Vec::with_capacity(self.order.len());
        for name in &self.order {
            reports.push(self.run(name)?);
        }
        Ok(reports)
    }

    /// Run one task to completion.
    ///
    /// Per-file step failures are logged and counted but never abort the
    /// run; the only errors surfaced here are structural (unknown task,
    /// step recipe that cannot be compiled, unwritable destination).
    pub fn run(&self, name: &str) -> Result<RunReport> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| anyhow!("unknown task '{name}'"))?;

        let started = Instant::now();

        // Templates and stylesheet partials resolve against the first
        // pattern's base.
        let step_paths = StepPaths {
            base_dir: self.root.join(&task.sources[0].base),
        };

        let mut steps = Vec::with_capacity(task.steps.len());
        for step_cfg in &task.steps {
            let step = Step::compile(step_cfg, &step_paths)
                .map_err(|e| anyhow!("compiling steps for task '{name}': {e}"))?;
            steps.push(step);
        }

        let mut written = Vec::new();
        let mut failed = 0usize;

        for (source, base_dir) in self.select_sources(task) {
            match self.build_one(task, &steps, &source, &base_dir) {
                Ok(Some(out_path)) => written.push(out_path),
                Ok(None) => {}
                Err(err) => {
                    failed += 1;
                    warn!(task = %name, path = ?source, error = %err, "file failed; continuing");
                }
            }
        }

        let report = RunReport {
            task: name.to_string(),
            written,
            failed,
            duration: started.elapsed(),
        };

        info!(
            task = %name,
            written = report.written.len(),
            failed = report.failed,
            ms = report.duration.as_millis() as u64,
            "task run finished"
        );

        Ok(report)
    }

    /// All files the task selects, paired with the base directory of the
    /// glob that selected them.
    ///
    /// Every distinct pattern base is walked; a file matching more than one
    /// pattern (or reachable from overlapping bases) is built once, against
    /// the base of the first pattern that matches it.
    fn select_sources(&self, task: &Task) -> Vec<(PathBuf, PathBuf)> {
        let mut bases: Vec<&Path> = Vec::new();
        for source in &task.sources {
            if !bases.contains(&source.base.as_path()) {
                bases.push(source.base.as_path());
            }
        }

        let mut seen = BTreeSet::new();
        let mut sources = Vec::new();

        for base in bases {
            let base_dir = self.root.join(base);
            if !base_dir.is_dir() {
                debug!(task = %task.name, dir = ?base_dir, "source directory missing; nothing to do");
                continue;
            }

            for entry in WalkDir::new(&base_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();

                let Ok(rel) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let Some(source_glob) = task.selects(&slash_path(rel)) else {
                    continue;
                };
                if self.is_partial(path) {
                    debug!(task = %task.name, path = ?rel, "skipping partial");
                    continue;
                }
                if !seen.insert(path.to_path_buf()) {
                    continue;
                }

                sources.push((path.to_path_buf(), self.root.join(&source_glob.base)));
            }
        }

        sources
    }

    fn is_partial(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| {
                n.to_string_lossy()
                    .starts_with(self.partial_prefix.as_str())
            })
            .unwrap_or(false)
    }

    /// Pipe one source file through the task's steps and write the result.
    ///
    /// `base_dir` is the base of the glob that selected `source`; the
    /// output path mirrors the source's position under it.
    ///
    /// Returns the written output path, or `None` if a step dropped the
    /// file.
    fn build_one(
        &self,
        task: &Task,
        steps: &[Step],
        source: &Path,
        base_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let rel = source
            .strip_prefix(base_dir)
            .unwrap_or(source)
            .to_path_buf();

        let contents = fs::read(source).with_context(|| format!("reading {source:?}"))?;
        let mut asset = Asset::new(rel, contents);

        for step in steps {
            match step.apply(asset)? {
                Some(next) => asset = next,
                None => return Ok(None),
            }
        }

        let out_rel = match &task.rename {
            Some(rule) => apply_rename(&asset.rel, rule),
            None => asset.rel.clone(),
        };
        let out_path = self.root.join(&task.dest).join(&out_rel);

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {parent:?}"))?;
        }
        fs::write(&out_path, &asset.contents)
            .with_context(|| format!("writing output {out_path:?}"))?;

        debug!(task = %task.name, out = ?out_path, "wrote output");
        Ok(Some(out_path))
    }
}

/// Apply a rename rule to an output path: replace the extension and/or
/// insert a suffix between stem and extension.
pub fn apply_rename(rel: &Path, rule: &RenameRule) -> PathBuf {
    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let ext = rule
        .ext
        .as_deref()
        .map(|e| e.trim_start_matches('.').to_string())
        .or_else(|| {
            rel.extension()
                .map(|e| e.to_string_lossy().into_owned())
        });

    let suffix = rule.suffix.as_deref().unwrap_or("");

    let file_name = match ext {
        Some(ext) if !ext.is_empty() => format!("{stem}{suffix}.{ext}"),
        _ => format!("{stem}{suffix}"),
    };

    rel.with_file_name(file_name)
}

/// Static directory prefix of a glob pattern: everything before the first
/// component containing a wildcard.
///
/// `src/scss/**/*.scss` -> `src/scss`, `*.txt` -> ``.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::Normal(part) => {
                let s = part.to_string_lossy();
                if s.contains(['*', '?', '[', '{']) {
                    break;
                }
                base.push(part);
            }
            other => base.push(other),
        }
    }
    // A wildcard-free pattern names a single file; its base is the parent.
    if base == Path::new(pattern) {
        base.pop();
    }
    base
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        // `*` must stop at path separators; only `**` recurses.
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
