// src/errors.rs

//! Crate-wide error types.
//!
//! Application-level wiring uses `anyhow`; per-file transformation failures
//! have their own taxonomy so the pipeline runner can report them without
//! aborting the rest of the run.

use thiserror::Error;

pub use anyhow::{Error, Result};

/// Failure of a single pipeline step applied to a single file.
///
/// These are always non-fatal: the runner logs them and moves on to the
/// next matched file.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("sass error: {0}")]
    Sass(String),

    #[error("css error: {0}")]
    Css(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("filter command exited with status {status}: {stderr}")]
    Command { status: i32, stderr: String },

    #[error("file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
