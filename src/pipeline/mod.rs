// src/pipeline/mod.rs

//! Task pipelines: selecting source files and transforming them into
//! output files.
//!
//! - [`registry`] owns the task table and the per-task runner: walk the
//!   source tree, match include/exclude globs, apply the steps to each file
//!   and write the result to the destination directory.
//! - [`step`] is the tagged step enum dispatching to the concrete
//!   transformations.
//! - The remaining modules each wrap one delegated capability: template
//!   rendering (`render`), SCSS compilation and CSS minification (`styles`),
//!   HTML cleanup (`markup`), image recompression (`images`) and external
//!   filter commands (`exec`).
//!
//! Failure policy everywhere: a failing step for one file is logged and
//! skipped; it never aborts the rest of the run.

pub mod exec;
pub mod images;
pub mod markup;
pub mod registry;
pub mod render;
pub mod step;
pub mod styles;

pub use registry::{Registry, RunReport, Task};
pub use step::{Asset, Step};
