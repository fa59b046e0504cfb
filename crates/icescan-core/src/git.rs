//! Git collaborator: clone, commit listing, checkout.
//!
//! All operations shell out to `git` and block until complete. Any
//! failure here is a fatal harness error, never a classifiable build
//! outcome.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Per-commit checkout seam used by the scan walker.
pub trait Checkout: Send + Sync {
    /// Move the working copy to the given commit. Fails fatally if the
    /// identifier is invalid.
    fn checkout(&self, sha: &str) -> Result<()>;
}

/// Subprocess git wrapper bound to one working copy.
#[derive(Debug)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Clone `url` into `dir` and return a handle to the working copy.
    pub fn clone_into(url: &str, dir: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["clone", url])
            .arg(dir)
            .output()
            .map_err(|e| Error::Git(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(format!("git clone '{url}' failed: {stderr}")));
        }

        Ok(Self {
            workdir: dir.to_path_buf(),
        })
    }

    /// Commit identifiers reachable from HEAD, newest first, at most
    /// `max` of them.
    pub fn list_commits(&self, max: usize) -> Result<Vec<String>> {
        let output = self
            .run(&["rev-list", &format!("--max-count={max}"), "HEAD"])?;
        Ok(output.lines().map(|l| l.trim().to_string()).collect())
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| Error::Git(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(format!("git {} failed: {stderr}", args[0])));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Checkout for GitCli {
    fn checkout(&self, sha: &str) -> Result<()> {
        self.run(&["checkout", "--quiet", sha])?;
        Ok(())
    }
}
