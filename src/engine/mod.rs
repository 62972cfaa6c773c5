// src/engine/mod.rs

//! Dispatch runtime for sitepipe.
//!
//! This module ties together:
//! - the task registry (what to run)
//! - the watch bindings (when to run it)
//! - the reload notifier (who to tell afterwards)
//!
//! The runtime consumes a single event queue and handles each event to
//! completion before the next one: no debouncing, no coalescing, no
//! parallel pipeline runs.

pub mod runtime;

pub use runtime::{Runtime, RuntimeEvent};
