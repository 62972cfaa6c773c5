// src/pipeline/styles.rs

//! Stylesheet steps: SCSS compilation (delegated to `grass`) and CSS
//! minification (delegated to `lightningcss`).

use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::config::model::SassStyle;
use crate::errors::StepError;
use crate::pipeline::step::Asset;

/// Compiles a single SCSS file to CSS.
///
/// `load_path` is the task's base directory so `@use` / `@import` resolve
/// partials next to the entry file.
#[derive(Debug)]
pub struct SassCompiler {
    load_path: PathBuf,
    style: SassStyle,
}

impl SassCompiler {
    pub fn new(load_path: &Path, style: SassStyle) -> Self {
        Self {
            load_path: load_path.to_path_buf(),
            style,
        }
    }

    pub fn apply(&self, asset: Asset) -> Result<Option<Asset>, StepError> {
        let (rel, source) = asset.into_text()?;

        let style = match self.style {
            SassStyle::Expanded => grass::OutputStyle::Expanded,
            SassStyle::Compressed => grass::OutputStyle::Compressed,
        };
        let options = grass::Options::default()
            .style(style)
            .load_path(&self.load_path);

        let css =
            grass::from_string(source, &options).map_err(|e| StepError::Sass(e.to_string()))?;

        Ok(Some(Asset::new(rel, css.into_bytes())))
    }
}

/// Minifies CSS.
#[derive(Debug)]
pub struct CssMinifier;

impl CssMinifier {
    pub fn apply(&self, asset: Asset) -> Result<Option<Asset>, StepError> {
        let (rel, source) = asset.into_text()?;

        let mut sheet = StyleSheet::parse(&source, ParserOptions::default())
            .map_err(|e| StepError::Css(e.to_string()))?;
        sheet
            .minify(MinifyOptions::default())
            .map_err(|e| StepError::Css(e.to_string()))?;
        let out = sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| StepError::Css(e.to_string()))?;

        Ok(Some(Asset::new(rel, out.code.into_bytes())))
    }
}
