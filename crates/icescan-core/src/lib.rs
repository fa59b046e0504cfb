//! icescan core library
//!
//! Walks the commit history of a repository, rebuilds each revision
//! with cargo, and classifies every build outcome to detect internal
//! compiler errors (ICEs) that are distinguishable from ordinary,
//! expected compilation failures.

pub mod classify;
pub mod config;
pub mod error;
pub mod git;
pub mod invoke;
pub mod report;
pub mod session;
pub mod telemetry;
pub mod walker;

pub use classify::{classify, OutcomeKind, PatternSet};
pub use config::{CargoConfig, RepoSource, ScanConfig};
pub use error::{Error, Result};
pub use git::{Checkout, GitCli};
pub use invoke::{BuildDriver, BuildInvocation, BuildResult, CargoInvoker, Subcommand};
pub use report::{Commit, ScanRecord, ScanReport};
pub use session::ScanSession;
pub use telemetry::init_tracing;
pub use walker::{progress_percent, CommitScanWalker, ScanOutcome, WalkerState};

/// icescan version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
