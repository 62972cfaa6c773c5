// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to the built-in default
//!   pipeline (`loader.rs`).
//! - Validate basic invariants like task references and build-order
//!   correctness (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config, load_and_validate, load_from_path};
pub use model::{
    BuildSection, ConfigFile, RenameRule, SassStyle, ServeSection, StepConfig, TaskConfig,
    WatchBinding,
};
pub use validate::{build_order, validate_config};
