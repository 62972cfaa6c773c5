// src/pipeline/exec.rs

//! External filter command step.
//!
//! Pipes a file through a shell command's stdin/stdout. This is how the
//! pipeline reaches capabilities without a library equivalent, like script
//! transpilation (`esbuild`, `tsc`, `babel`).

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::errors::StepError;
use crate::pipeline::step::Asset;

#[derive(Debug, Clone)]
pub struct CommandFilter {
    cmd: String,
}

impl CommandFilter {
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
        }
    }

    pub fn apply(&self, asset: Asset) -> Result<Option<Asset>, StepError> {
        debug!(cmd = %self.cmd, path = ?asset.rel, "running filter command");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from a separate thread so a command that writes before
        // reading everything cannot deadlock against a full pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = asset.contents.clone();
            std::thread::spawn(move || {
                let _ = stdin.write_all(&input);
            })
        });

        let output = child.wait_with_output()?;
        if let Some(handle) = writer {
            let _ = handle.join();
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(StepError::Command {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(Some(Asset::new(asset.rel, output.stdout)))
    }
}
