//! Build tool invocation.
//!
//! Runs the external build tool (cargo) against a checked-out working
//! directory and captures the exit status and merged output text. A
//! non-zero exit is an ordinary result to be classified, never an
//! invoker error; only a binary that cannot be spawned at all is fatal.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Build tool subcommands the scan issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    /// Full build. Used once per session for the baseline commit.
    Build,
    /// Incremental check. Used for every scanned commit.
    Check,
    /// Artifact removal. Issued after a detected ICE to reclaim disk
    /// space and discard possibly corrupt incremental state.
    Clean,
}

impl Subcommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcommand::Build => "build",
            Subcommand::Check => "check",
            Subcommand::Clean => "clean",
        }
    }
}

/// Configuration under which the build tool runs. Constructed once per
/// session and immutable thereafter.
#[derive(Debug, Clone)]
pub struct BuildInvocation {
    /// Working directory of the checked-out repository.
    pub workdir: PathBuf,

    /// Optional toolchain qualifier, passed as `+<toolchain>`.
    pub toolchain: Option<String>,

    /// Extra environment overrides. Keys present here replace the
    /// process-inherited value; everything else passes through.
    pub env: BTreeMap<String, String>,

    /// Per-invocation timeout in seconds. 0 means no timeout.
    pub timeout_secs: u64,
}

/// Exit status and merged output of one build invocation.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub exit_code: i32,
    pub output: String,
}

/// Seam between the scan walker and the external build tool.
#[async_trait]
pub trait BuildDriver: Send + Sync {
    async fn run(&self, subcommand: Subcommand) -> Result<BuildResult>;
}

/// Production driver that spawns cargo.
pub struct CargoInvoker {
    program: String,
    invocation: BuildInvocation,
}

impl CargoInvoker {
    pub fn new(invocation: BuildInvocation) -> Self {
        Self::with_program("cargo", invocation)
    }

    /// Use a different build tool binary. Primarily for tests.
    pub fn with_program(program: impl Into<String>, invocation: BuildInvocation) -> Self {
        Self {
            program: program.into(),
            invocation,
        }
    }
}

#[async_trait]
impl BuildDriver for CargoInvoker {
    async fn run(&self, subcommand: Subcommand) -> Result<BuildResult> {
        let inv = &self.invocation;

        let mut cmd = Command::new(&self.program);
        if let Some(toolchain) = &inv.toolchain {
            cmd.arg(format!("+{toolchain}"));
        }
        cmd.arg(subcommand.as_str())
            .envs(&inv.env)
            .current_dir(&inv.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Reap the build tool if we stop waiting on it (timeout path).
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| Error::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let output = if inv.timeout_secs > 0 {
            let wait = tokio::time::timeout(
                Duration::from_secs(inv.timeout_secs),
                child.wait_with_output(),
            );
            match wait.await {
                Ok(result) => result?,
                Err(_) => {
                    // Synthetic result: matches no marker, so it
                    // classifies as an unexpected failure.
                    return Ok(BuildResult {
                        exit_code: -1,
                        output: format!(
                            "{} {} timed out after {} seconds",
                            self.program,
                            subcommand.as_str(),
                            inv.timeout_secs
                        ),
                    });
                }
            }
        } else {
            child.wait_with_output().await?
        };

        let mut merged = String::from_utf8_lossy(&output.stdout).into_owned();
        merged.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(BuildResult {
            exit_code: output.status.code().unwrap_or(-1),
            output: merged,
        })
    }
}
