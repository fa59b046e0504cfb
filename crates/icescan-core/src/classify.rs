//! Build outcome classification.
//!
//! A build result is mapped to one of four outcome kinds from its exit
//! status and merged output text alone. Matching is plain case-sensitive
//! substring containment against the configured marker lists; priority
//! is fixed: success, then ICE markers, then expected-failure markers.

use serde::{Deserialize, Serialize};

/// Classification of a single build invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// The build exited zero. Output content is irrelevant.
    Success,

    /// A normal compile error attributable to the input source.
    ExpectedFailure,

    /// The compiler itself failed: a defect in the compiler, not the input.
    InternalCompilerError,

    /// A non-zero exit matching no known marker. Harness-level anomaly;
    /// the scan must not continue past one of these.
    UnexpectedFailure,
}

/// Marker substrings that drive classification.
///
/// Both lists are configuration; new markers need no code changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternSet {
    /// Substrings signalling an internal compiler error.
    #[serde(default = "default_ice_markers")]
    pub ice: Vec<String>,

    /// Substrings signalling an ordinary, tolerated compile failure.
    #[serde(default = "default_expected_markers")]
    pub expected: Vec<String>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            ice: default_ice_markers(),
            expected: default_expected_markers(),
        }
    }
}

fn default_ice_markers() -> Vec<String> {
    vec!["error: internal compiler error: unexpected panic".to_string()]
}

fn default_expected_markers() -> Vec<String> {
    vec![
        "error: could not compile".to_string(),
        "failed to load source for dependency".to_string(),
    ]
}

/// Classify one build result.
///
/// A zero exit is always `Success`, even if incidental warning text
/// happens to contain a marker substring. On non-zero exit, ICE markers
/// are checked before expected-failure markers so that an ICE message
/// carrying compile-error boilerplate is never shadowed by the broader
/// match.
pub fn classify(exit_code: i32, output: &str, patterns: &PatternSet) -> OutcomeKind {
    if exit_code == 0 {
        return OutcomeKind::Success;
    }
    if contains_any(output, &patterns.ice) {
        return OutcomeKind::InternalCompilerError;
    }
    if contains_any(output, &patterns.expected) {
        return OutcomeKind::ExpectedFailure;
    }
    OutcomeKind::UnexpectedFailure
}

fn contains_any(haystack: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| haystack.contains(m.as_str()))
}
