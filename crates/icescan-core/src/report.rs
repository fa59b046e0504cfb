//! Scan report types.

use crate::classify::OutcomeKind;
use serde::{Deserialize, Serialize};

/// A commit identifier together with its position in the walk order
/// (0 = oldest commit in the scanned range).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub index: usize,
}

impl Commit {
    /// Abbreviated hash for log lines.
    pub fn short(&self) -> &str {
        &self.sha[..12.min(self.sha.len())]
    }
}

/// Classification of one scanned commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanRecord {
    pub commit: Commit,
    pub outcome: OutcomeKind,
}

/// Per-repository scan result, built incrementally by the walker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Outcome of the baseline build of the oldest commit. `None` only
    /// when the commit range was empty.
    pub baseline: Option<ScanRecord>,

    /// One record per scanned commit, in walk order.
    pub records: Vec<ScanRecord>,
}

impl ScanReport {
    /// Whether any scanned commit (baseline included) produced an ICE.
    pub fn ice_found(&self) -> bool {
        self.baseline
            .iter()
            .chain(self.records.iter())
            .any(|r| r.outcome == OutcomeKind::InternalCompilerError)
    }

    /// Number of commits visited by the scan loop.
    pub fn scanned_count(&self) -> usize {
        self.records.len()
    }
}
