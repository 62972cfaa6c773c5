// src/pipeline/render.rs

//! Template rendering step, delegated to `tera`.
//!
//! The whole template set of the task is loaded so non-buildable partials
//! (e.g. `_header.ejs`) can be included from buildable pages. The renderer
//! is rebuilt at the start of every task run, so partial edits are picked
//! up without restarting the watch session.

use std::fs;
use std::path::Path;

use tera::{Context, Tera};
use tracing::warn;
use walkdir::WalkDir;

use crate::errors::StepError;
use crate::pipeline::step::{Asset, slash_path};

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load every file under `template_dir` as a template, named relative
    /// to it with forward slashes.
    ///
    /// Loading is lenient: a file that cannot be read or parsed is logged
    /// and skipped, so one broken template only fails its own page at
    /// render time while the rest of the set stays buildable.
    pub fn new(template_dir: &Path) -> Result<Self, StepError> {
        let mut templates: Vec<(String, String)> = Vec::new();

        if template_dir.is_dir() {
            for entry in WalkDir::new(template_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let Ok(rel) = entry.path().strip_prefix(template_dir) else {
                    continue;
                };
                let name = slash_path(rel);

                let source = match fs::read_to_string(entry.path()) {
                    Ok(source) => source,
                    Err(err) => {
                        warn!(template = %name, error = %err, "skipping unreadable template");
                        continue;
                    }
                };

                // Parse each file on its own so a syntax error only knocks
                // out that template, not the whole set.
                if let Err(err) = Tera::default().add_raw_template(&name, &source) {
                    warn!(template = %name, error = %err, "skipping unparseable template");
                    continue;
                }

                templates.push((name, source));
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        // Pages carry template extensions, not `.html`; output escaping is
        // not wanted for static-site sources.
        tera.autoescape_on(vec![]);
        Ok(Self { tera })
    }

    pub fn apply(&self, asset: Asset) -> Result<Option<Asset>, StepError> {
        let name = slash_path(&asset.rel);
        let rendered = self.tera.render(&name, &Context::new())?;
        Ok(Some(Asset::new(asset.rel, rendered.into_bytes())))
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}
