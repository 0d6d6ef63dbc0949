//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic strings throughout the codebase.

/// Name of the manifest file rewritten in each repository.
pub const MANIFEST_FILE: &str = "package.json";

/// Branch created to carry the dependency updates.
pub const DEFAULT_BRANCH: &str = "dependency-updates";

/// Commit message, also used as the pull request title.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update npm dependencies";

/// Remote the update branch is pushed to.
pub const DEFAULT_REMOTE: &str = "origin";

/// Branch the pull request targets.
pub const DEFAULT_BASE_BRANCH: &str = "master";

/// GitHub REST endpoint used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// User agent sent with hosting API requests. GitHub rejects requests without one.
pub const USER_AGENT: &str = "git-dep-bump";

/// Number of threads for parallel stage execution.
/// Higher than CPU count because every stage is process or network bound.
pub const RAYON_THREAD_COUNT: usize = 60;

/// Progress bar tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;

/// Default name used when a repository name cannot be determined from its path.
pub const DEFAULT_REPO_NAME: &str = "repository";
