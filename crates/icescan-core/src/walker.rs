//! Batched commit scan walker.
//!
//! Drives one ordered, oldest-first commit sequence: a baseline `build`
//! of the oldest commit, then an incremental `check` of every commit in
//! fixed-size batches, applying per-outcome policy and emitting progress
//! after each batch.
//!
//! Policy per classified outcome:
//! - `Success` / `ExpectedFailure`: record and continue.
//! - `InternalCompilerError`: record, log the browsable commit URL,
//!   `clean` the build cache (ICEs leave partial incremental state that
//!   could distort the next commit's classification), continue.
//! - `UnexpectedFailure`: record and abort the whole walk; the raw
//!   output travels up for the driver to log verbatim.

use crate::classify::{classify, OutcomeKind, PatternSet};
use crate::config::RepoSource;
use crate::error::Result;
use crate::git::Checkout;
use crate::invoke::{BuildDriver, Subcommand};
use crate::report::{Commit, ScanRecord, ScanReport};
use tracing::{info, warn};

/// Walker lifecycle. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    Idle,
    BaselineBuilt,
    Scanning,
    Done,
    Aborted,
}

/// Final result of one walk.
#[derive(Debug)]
pub enum ScanOutcome {
    /// All batches processed.
    Completed(ScanReport),

    /// An unexpected failure stopped the walk. Carries the partial
    /// report, the offending commit, and its raw build output.
    Aborted {
        report: ScanReport,
        commit: Commit,
        output: String,
    },
}

impl ScanOutcome {
    /// The report assembled so far, complete or partial.
    pub fn report(&self) -> &ScanReport {
        match self {
            ScanOutcome::Completed(report) => report,
            ScanOutcome::Aborted { report, .. } => report,
        }
    }
}

/// Walks one commit sequence against one working copy.
///
/// Borrows the build driver and checkout handle for the duration of one
/// walk; never outlives the owning session.
pub struct CommitScanWalker<'a> {
    driver: &'a dyn BuildDriver,
    vcs: &'a dyn Checkout,
    source: &'a RepoSource,
    patterns: &'a PatternSet,
    batch_size: usize,
    state: WalkerState,
}

impl<'a> CommitScanWalker<'a> {
    pub fn new(
        driver: &'a dyn BuildDriver,
        vcs: &'a dyn Checkout,
        source: &'a RepoSource,
        patterns: &'a PatternSet,
        batch_size: usize,
    ) -> Self {
        Self {
            driver,
            vcs,
            source,
            patterns,
            batch_size,
            state: WalkerState::Idle,
        }
    }

    pub fn state(&self) -> WalkerState {
        self.state
    }

    /// Walk the given oldest-first commit sequence to completion or abort.
    ///
    /// The baseline `build` of the oldest commit is a bootstrap step,
    /// not a scan visit: the scan loop still visits every supplied
    /// commit exactly once, the oldest included.
    pub async fn walk(&mut self, commits: &[Commit]) -> Result<ScanOutcome> {
        let mut report = ScanReport::default();

        let Some(oldest) = commits.first() else {
            self.state = WalkerState::Done;
            return Ok(ScanOutcome::Completed(report));
        };

        // Baseline: a full build so later checks run incrementally
        // against real artifacts.
        info!(commit = %oldest.short(), "building baseline commit");
        self.vcs.checkout(&oldest.sha)?;
        let result = self.driver.run(Subcommand::Build).await?;
        let outcome = classify(result.exit_code, &result.output, self.patterns);
        if outcome != OutcomeKind::Success {
            // The starting point itself already fails; callers observe
            // this through the report, the walk goes on.
            warn!(commit = %oldest.short(), outcome = ?outcome, "baseline build did not succeed");
        }
        report.baseline = Some(ScanRecord {
            commit: oldest.clone(),
            outcome,
        });
        self.state = WalkerState::BaselineBuilt;

        let total = commits.len();
        self.state = WalkerState::Scanning;

        for batch in commits.chunks(self.batch_size) {
            for commit in batch {
                self.vcs.checkout(&commit.sha)?;
                let result = self.driver.run(Subcommand::Check).await?;
                let outcome = classify(result.exit_code, &result.output, self.patterns);
                report.records.push(ScanRecord {
                    commit: commit.clone(),
                    outcome,
                });

                match outcome {
                    OutcomeKind::InternalCompilerError => {
                        warn!(
                            url = %self.source.commit_url(&commit.sha),
                            "internal compiler error detected"
                        );
                        self.driver.run(Subcommand::Clean).await?;
                    }
                    OutcomeKind::UnexpectedFailure => {
                        self.state = WalkerState::Aborted;
                        return Ok(ScanOutcome::Aborted {
                            report,
                            commit: commit.clone(),
                            output: result.output,
                        });
                    }
                    OutcomeKind::Success | OutcomeKind::ExpectedFailure => {}
                }
            }

            let processed = report.records.len();
            let percent = progress_percent(processed, total);
            info!("progress: {processed}/{total} ({percent}%)");
        }

        self.state = WalkerState::Done;
        Ok(ScanOutcome::Completed(report))
    }
}

/// Whole-number progress percentage, rounded for display.
pub fn progress_percent(processed: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((processed as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::BuildResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn ok() -> BuildResult {
        BuildResult {
            exit_code: 0,
            output: String::new(),
        }
    }

    fn ice() -> BuildResult {
        BuildResult {
            exit_code: 101,
            output: "error: internal compiler error: unexpected panic at foo.rs:12".to_string(),
        }
    }

    fn compile_error() -> BuildResult {
        BuildResult {
            exit_code: 101,
            output: "error: could not compile `foo`".to_string(),
        }
    }

    fn unknown_error() -> BuildResult {
        BuildResult {
            exit_code: 101,
            output: "error: linker `cc` not found".to_string(),
        }
    }

    /// Replays a fixed sequence of build/check results; `clean` always
    /// succeeds and consumes nothing.
    struct ScriptedDriver {
        responses: Mutex<VecDeque<BuildResult>>,
        calls: Mutex<Vec<Subcommand>>,
    }

    impl ScriptedDriver {
        fn new(responses: Vec<BuildResult>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Subcommand> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BuildDriver for ScriptedDriver {
        async fn run(&self, subcommand: Subcommand) -> Result<BuildResult> {
            self.calls.lock().unwrap().push(subcommand);
            if subcommand == Subcommand::Clean {
                return Ok(ok());
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("walker issued more build invocations than scripted"))
        }
    }

    #[derive(Default)]
    struct RecordingCheckout {
        shas: Mutex<Vec<String>>,
    }

    impl RecordingCheckout {
        fn shas(&self) -> Vec<String> {
            self.shas.lock().unwrap().clone()
        }
    }

    impl Checkout for RecordingCheckout {
        fn checkout(&self, sha: &str) -> Result<()> {
            self.shas.lock().unwrap().push(sha.to_string());
            Ok(())
        }
    }

    fn commits(n: usize) -> Vec<Commit> {
        (0..n)
            .map(|i| Commit {
                sha: format!("{i:040x}"),
                index: i,
            })
            .collect()
    }

    fn source() -> RepoSource {
        RepoSource::parse("git@github.com:example/widget.git").unwrap()
    }

    async fn walk(
        driver: &ScriptedDriver,
        vcs: &RecordingCheckout,
        source: &RepoSource,
        batch_size: usize,
        commits: &[Commit],
    ) -> (ScanOutcome, WalkerState) {
        let patterns = PatternSet::default();
        let mut walker = CommitScanWalker::new(driver, vcs, source, &patterns, batch_size);
        let outcome = walker.walk(commits).await.unwrap();
        (outcome, walker.state())
    }

    #[tokio::test]
    async fn test_visits_commits_in_order_exactly_once() {
        let commits = commits(3);
        // Baseline build + three checks.
        let driver = ScriptedDriver::new(vec![ok(), ok(), ok(), ok()]);
        let vcs = RecordingCheckout::default();
        let source = source();

        let (outcome, state) = walk(&driver, &vcs, &source, 20, &commits).await;

        assert_eq!(state, WalkerState::Done);
        let report = outcome.report();
        assert_eq!(report.scanned_count(), 3);
        for (i, record) in report.records.iter().enumerate() {
            assert_eq!(record.commit.sha, commits[i].sha);
            assert_eq!(record.outcome, OutcomeKind::Success);
        }
        // Baseline checkout of the oldest, then one checkout per scanned commit.
        let expected: Vec<String> = std::iter::once(commits[0].sha.clone())
            .chain(commits.iter().map(|c| c.sha.clone()))
            .collect();
        assert_eq!(vcs.shas(), expected);
    }

    #[tokio::test]
    async fn test_baseline_uses_build_and_scan_uses_check() {
        let commits = commits(2);
        let driver = ScriptedDriver::new(vec![ok(), ok(), ok()]);
        let vcs = RecordingCheckout::default();
        let source = source();

        walk(&driver, &vcs, &source, 20, &commits).await;

        let calls = driver.calls();
        assert_eq!(calls[0], Subcommand::Build);
        assert!(calls[1..].iter().all(|c| *c == Subcommand::Check));
    }

    #[tokio::test]
    async fn test_failing_baseline_is_recorded_but_does_not_abort() {
        let commits = commits(2);
        let driver = ScriptedDriver::new(vec![unknown_error(), ok(), ok()]);
        let vcs = RecordingCheckout::default();
        let source = source();

        let (outcome, state) = walk(&driver, &vcs, &source, 20, &commits).await;

        assert_eq!(state, WalkerState::Done);
        let report = outcome.report();
        assert_eq!(
            report.baseline.as_ref().unwrap().outcome,
            OutcomeKind::UnexpectedFailure
        );
        assert_eq!(report.scanned_count(), 2);
    }

    #[tokio::test]
    async fn test_ice_records_cleans_and_continues() {
        let commits = commits(2);
        let driver = ScriptedDriver::new(vec![ok(), ice(), ok()]);
        let vcs = RecordingCheckout::default();
        let source = source();

        let (outcome, state) = walk(&driver, &vcs, &source, 20, &commits).await;

        assert_eq!(state, WalkerState::Done);
        let report = outcome.report();
        assert!(report.ice_found());
        assert_eq!(report.records[0].outcome, OutcomeKind::InternalCompilerError);
        // The commit after the ICE is still checked.
        assert_eq!(report.records[1].outcome, OutcomeKind::Success);

        let cleans = driver
            .calls()
            .iter()
            .filter(|c| **c == Subcommand::Clean)
            .count();
        assert_eq!(cleans, 1);
    }

    #[tokio::test]
    async fn test_expected_failure_is_tolerated() {
        let commits = commits(2);
        let driver = ScriptedDriver::new(vec![ok(), compile_error(), ok()]);
        let vcs = RecordingCheckout::default();
        let source = source();

        let (outcome, state) = walk(&driver, &vcs, &source, 20, &commits).await;

        assert_eq!(state, WalkerState::Done);
        let report = outcome.report();
        assert!(!report.ice_found());
        assert_eq!(report.records[0].outcome, OutcomeKind::ExpectedFailure);
        assert!(!driver.calls().contains(&Subcommand::Clean));
    }

    #[tokio::test]
    async fn test_unexpected_failure_aborts_before_next_commit() {
        let commits = commits(2);
        let driver = ScriptedDriver::new(vec![ok(), unknown_error()]);
        let vcs = RecordingCheckout::default();
        let source = source();

        let (outcome, state) = walk(&driver, &vcs, &source, 20, &commits).await;

        assert_eq!(state, WalkerState::Aborted);
        match outcome {
            ScanOutcome::Aborted {
                report,
                commit,
                output,
            } => {
                assert_eq!(commit.sha, commits[0].sha);
                assert!(output.contains("linker"));
                assert_eq!(report.scanned_count(), 1);
                assert_eq!(
                    report.records[0].outcome,
                    OutcomeKind::UnexpectedFailure
                );
            }
            ScanOutcome::Completed(_) => panic!("walk should have aborted"),
        }
        // The second commit is never checked out by the scan loop.
        assert_eq!(vcs.shas().len(), 2); // baseline + first scanned commit
    }

    #[tokio::test]
    async fn test_empty_commit_list_completes_immediately() {
        let driver = ScriptedDriver::new(vec![]);
        let vcs = RecordingCheckout::default();
        let source = source();

        let (outcome, state) = walk(&driver, &vcs, &source, 20, &[]).await;

        assert_eq!(state, WalkerState::Done);
        let report = outcome.report();
        assert!(report.baseline.is_none());
        assert_eq!(report.scanned_count(), 0);
        assert!(driver.calls().is_empty());
        assert!(vcs.shas().is_empty());
    }

    #[tokio::test]
    async fn test_45_commits_batch_20_scans_all() {
        let commits = commits(45);
        let mut responses = vec![ok()]; // baseline
        responses.extend((0..45).map(|_| ok()));
        let driver = ScriptedDriver::new(responses);
        let vcs = RecordingCheckout::default();
        let source = source();

        let (outcome, state) = walk(&driver, &vcs, &source, 20, &commits).await;

        assert_eq!(state, WalkerState::Done);
        assert_eq!(outcome.report().scanned_count(), 45);
    }

    #[test]
    fn test_progress_percent_rounding() {
        // 45 commits, batch size 20: reports after 20, 40, 45.
        assert_eq!(progress_percent(20, 45), 44);
        assert_eq!(progress_percent(40, 45), 89);
        assert_eq!(progress_percent(45, 45), 100);
    }

    #[test]
    fn test_progress_percent_edges() {
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(10, 10), 100);
        assert_eq!(progress_percent(0, 0), 100);
    }
}
