// src/serve/mod.rs

//! Dev server and live-reload channel.
//!
//! Serves the output directory over HTTP and pushes reload signals to
//! connected browsers over Server-Sent Events. Delivery is best-effort,
//! fire-and-forget: clients that lag or disconnect are simply dropped.

pub mod server;

pub use server::{
    ReloadMessage, ServerState, create_router, encode_message, inject_livereload,
    inject_livereload_into_dir,
};
