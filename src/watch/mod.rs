// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! This module is responsible for:
//! - Compiling the `[[watch]]` glob bindings.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** run pipelines itself; it only turns filesystem changes
//! into runtime events carrying the bound task names (in declaration
//! order) or reload requests.

pub mod patterns;
pub mod watcher;

pub use patterns::{CompiledBinding, compile_bindings};
pub use watcher::{WatcherHandle, spawn_watcher};
