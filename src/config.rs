//! Configuration types for CLI verbosity and pipeline options.

use crate::constants::{
    DEFAULT_BASE_BRANCH, DEFAULT_BRANCH, DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE,
};
use crate::github::Credentials;

/// Runtime configuration derived from CLI arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
}

impl Config {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// What the pipeline does to every repository in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Branch created for the update.
    pub branch: String,
    /// Commit message, reused as the pull request title.
    pub message: String,
    /// Remote the branch is pushed to.
    pub remote: String,
    /// Branch the pull request targets.
    pub base: String,
    /// Only run the read-only stages and report what would change.
    pub dry_run: bool,
    /// Pin `latest` instead of npm's `wanted` version.
    pub use_latest: bool,
    /// Resolve the remote and open a pull request after pushing.
    pub merge_request: bool,
    pub credentials: Credentials,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            base: DEFAULT_BASE_BRANCH.to_string(),
            dry_run: false,
            use_latest: false,
            merge_request: true,
            credentials: Credentials::default(),
        }
    }
}
