//! Per-repository scan orchestration.
//!
//! A session owns an ephemeral workspace directory for the lifetime of
//! one repository scan. The directory is removed on every exit path,
//! abort and error included, via `TempDir`'s drop.

use crate::config::{RepoSource, ScanConfig};
use crate::error::Result;
use crate::git::GitCli;
use crate::invoke::{BuildInvocation, CargoInvoker};
use crate::report::Commit;
use crate::walker::{CommitScanWalker, ScanOutcome};
use tracing::info;

/// Scans one repository from clone to report.
pub struct ScanSession<'a> {
    source: RepoSource,
    config: &'a ScanConfig,
}

impl<'a> ScanSession<'a> {
    pub fn new(source: RepoSource, config: &'a ScanConfig) -> Self {
        Self { source, config }
    }

    /// Clone, establish the baseline, walk the commit range, and return
    /// the outcome. Clone and listing failures are fatal harness errors.
    pub async fn run(&self) -> Result<ScanOutcome> {
        let workspace = tempfile::tempdir()?;

        info!(
            repo = %self.source.slug(),
            dest = %workspace.path().display(),
            "cloning repository"
        );
        let git = GitCli::clone_into(&self.source.url, workspace.path())?;

        // History is listed newest-first; the walker wants oldest-first.
        let mut shas = git.list_commits(self.config.commit_count)?;
        shas.reverse();
        let commits: Vec<Commit> = shas
            .into_iter()
            .enumerate()
            .map(|(index, sha)| Commit { sha, index })
            .collect();

        info!(repo = %self.source.slug(), commits = commits.len(), "scanning commit range");

        let invocation = BuildInvocation {
            workdir: workspace.path().to_path_buf(),
            toolchain: self.config.cargo.toolchain.clone(),
            env: self.config.cargo.env.clone(),
            timeout_secs: self.config.cargo.timeout_secs,
        };
        let invoker = CargoInvoker::new(invocation);

        let mut walker = CommitScanWalker::new(
            &invoker,
            &git,
            &self.source,
            &self.config.patterns,
            self.config.commit_batch_size,
        );
        walker.walk(&commits).await
    }
}
