// src/logging.rs

//! `tracing` setup.
//!
//! The `--log-level` flag, when given, pins a plain maximum level. Without
//! it the `SITEPIPE_LOG` variable is read as a full `EnvFilter` directive
//! string, so per-module filtering like `SITEPIPE_LOG=sitepipe=debug,tera=warn`
//! works. Neither set means `info`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Install the global subscriber. Call once, before any span or event.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_env("SITEPIPE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// The filter directive a CLI level stands for.
pub fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
