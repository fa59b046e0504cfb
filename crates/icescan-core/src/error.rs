//! Error taxonomy for icescan.
//!
//! Fatal conditions (bad configuration, git failures, an unlocatable
//! build tool) are error values that flow up to the binary's single
//! exit-code decision point. Classified build outcomes are never
//! errors; they are data handled by walker policy.

/// icescan harness errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed configuration: empty repository list, bad URL, etc.
    #[error("configuration error: {0}")]
    Config(String),

    /// A git clone, rev-list, or checkout failed.
    #[error("git error: {0}")]
    Git(String),

    /// The build tool binary could not be spawned at all.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for icescan operations.
pub type Result<T> = std::result::Result<T, Error>;
