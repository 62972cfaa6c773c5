// src/pipeline/step.rs

use std::path::{Path, PathBuf};

use crate::config::model::StepConfig;
use crate::errors::StepError;
use crate::pipeline::exec::CommandFilter;
use crate::pipeline::images::ImageCompressor;
use crate::pipeline::markup::HtmlCleaner;
use crate::pipeline::render::Renderer;
use crate::pipeline::styles::{CssMinifier, SassCompiler};

/// A file flowing through a pipeline: its path relative to the task's base
/// directory, plus its current contents.
#[derive(Debug, Clone)]
pub struct Asset {
    pub rel: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(rel: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            rel: rel.into(),
            contents,
        }
    }

    /// Consume the asset into its path and UTF-8 text, for text-based steps.
    pub fn into_text(self) -> Result<(PathBuf, String), StepError> {
        let text = String::from_utf8(self.contents)?;
        Ok((self.rel, text))
    }
}

/// Paths a step compiler may need.
#[derive(Debug, Clone)]
pub struct StepPaths {
    /// The task's base directory: templates are loaded from it, and `@use`
    /// / `@import` in stylesheets resolve against it.
    pub base_dir: PathBuf,
}

/// One compiled pipeline step: a pure function from a file to zero-or-one
/// output file.
pub enum Step {
    Render(Renderer),
    Sass(SassCompiler),
    CssMinify(CssMinifier),
    HtmlClean(HtmlCleaner),
    Image(ImageCompressor),
    Exec(CommandFilter),
}

impl Step {
    /// Compile a configured step into its runnable form.
    ///
    /// Step compilation happens at the start of every task run so template
    /// sets pick up partial edits between runs.
    pub fn compile(cfg: &StepConfig, paths: &StepPaths) -> Result<Self, StepError> {
        match cfg {
            StepConfig::Render => Ok(Step::Render(Renderer::new(&paths.base_dir)?)),
            StepConfig::Sass { style } => {
                Ok(Step::Sass(SassCompiler::new(&paths.base_dir, *style)))
            }
            StepConfig::CssMinify => Ok(Step::CssMinify(CssMinifier)),
            StepConfig::HtmlClean { remove_comments } => {
                Ok(Step::HtmlClean(HtmlCleaner::new(*remove_comments)))
            }
            StepConfig::Image { jpeg_quality } => {
                Ok(Step::Image(ImageCompressor::new(*jpeg_quality)))
            }
            StepConfig::Exec { cmd } => Ok(Step::Exec(CommandFilter::new(cmd))),
        }
    }

    /// Apply this step to one file.
    pub fn apply(&self, asset: Asset) -> Result<Option<Asset>, StepError> {
        match self {
            Step::Render(renderer) => renderer.apply(asset),
            Step::Sass(sass) => sass.apply(asset),
            Step::CssMinify(minifier) => minifier.apply(asset),
            Step::HtmlClean(cleaner) => cleaner.apply(asset),
            Step::Image(compressor) => compressor.apply(asset),
            Step::Exec(filter) => filter.apply(asset),
        }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Render(_) => "render",
            Step::Sass(_) => "sass",
            Step::CssMinify(_) => "css-minify",
            Step::HtmlClean(_) => "html-clean",
            Step::Image(_) => "image",
            Step::Exec(_) => "exec",
        }
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("kind", &self.name()).finish()
    }
}

/// Template/partial path helpers shared by the step compilers.
pub(crate) fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
