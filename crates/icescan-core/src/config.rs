//! Typed scan configuration.
//!
//! The YAML config file is parsed once at startup into [`ScanConfig`]
//! with explicit defaults for every recognized option. Validation
//! (non-empty repository list, well-formed GitHub SSH URLs) happens at
//! load time, before any workspace is created.

use crate::classify::PatternSet;
use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration for one scan run.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Repositories to scan, as GitHub SSH URLs.
    pub repositories: Vec<String>,

    /// How many commits (from the branch tip backwards) to scan.
    #[serde(default = "default_commit_count")]
    pub commit_count: usize,

    /// Commits per batch between progress reports.
    #[serde(default = "default_commit_batch_size")]
    pub commit_batch_size: usize,

    /// Cargo invocation settings.
    #[serde(default)]
    pub cargo: CargoConfig,

    /// Classification marker lists.
    #[serde(default)]
    pub patterns: PatternSet,
}

/// Settings for the cargo invocations issued during a scan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CargoConfig {
    /// Toolchain qualifier (e.g. `nightly`), passed as `+<toolchain>`.
    pub toolchain: Option<String>,

    /// Environment overrides applied on top of the process environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Per-invocation timeout in seconds. 0 disables the timeout.
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_commit_count() -> usize {
    100
}

fn default_commit_batch_size() -> usize {
    20
}

impl ScanConfig {
    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ScanConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parsed repository sources, in configured order.
    pub fn sources(&self) -> Result<Vec<RepoSource>> {
        self.repositories.iter().map(|u| RepoSource::parse(u)).collect()
    }

    fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(Error::Config(
                "no repositories defined in configuration".to_string(),
            ));
        }
        if self.commit_batch_size == 0 {
            return Err(Error::Config("commit_batch_size must be non-zero".to_string()));
        }
        for url in &self.repositories {
            RepoSource::parse(url)?;
        }
        Ok(())
    }
}

/// One repository to scan, extracted from its configured SSH URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSource {
    pub organization: String,
    pub repository: String,
    pub url: String,
}

impl RepoSource {
    /// Parse a `git@github.com:<organization>/<repository>.git` URL.
    pub fn parse(url: &str) -> Result<Self> {
        let pattern = Regex::new(r"^git@github\.com:([\w.-]+)/([\w.-]+)\.git$")
            .map_err(|e| Error::Config(format!("invalid repository URL pattern: {e}")))?;

        let captures = pattern.captures(url).ok_or_else(|| {
            Error::Config(format!(
                "invalid repository URL '{url}': expected git@github.com:<organization>/<repository>.git"
            ))
        })?;

        Ok(Self {
            organization: captures[1].to_string(),
            repository: captures[2].to_string(),
            url: url.to_string(),
        })
    }

    /// Browsable web reference for a commit of this repository.
    pub fn commit_url(&self, sha: &str) -> String {
        format!(
            "https://github.com/{}/{}/commit/{}",
            self.organization, self.repository, sha
        )
    }

    /// `organization/repository` label for log lines.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.organization, self.repository)
    }
}
