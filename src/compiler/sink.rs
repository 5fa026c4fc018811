//! Artifact sinks
//!
//! A sink is the external tool that takes over an intermediate file once it
//! has been written: the script transpiler for scripts, the style compiler
//! for stylesheets.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

pub trait ArtifactSink: Send + Sync {
    fn process(&self, path: &Path) -> Result<()>;
}

/// Leaves the file as written
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ArtifactSink for NoopSink {
    fn process(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Runs `[program, args...]` with `{file}` replaced by the artifact path
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    /// Builds a sink from `[program, args...]`; `None` if empty
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl ArtifactSink for CommandSink {
    fn process(&self, path: &Path) -> Result<()> {
        let file = path.display().to_string();
        let output = Command::new(&self.program)
            .args(self.args.iter().map(|arg| arg.replace("{file}", &file)))
            .output()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed on {}: {}", self.program, file, stderr.trim());
        }

        Ok(())
    }
}
