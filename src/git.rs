//! Git command wrappers.
//!
//! This module provides a thin wrapper around the git CLI. Callers get the
//! raw [`CommandOutput`] back and decide what counts as success.

use crate::process::{self, CommandError, CommandOutput};
use std::path::Path;

pub fn run_git(repo: &Path, args: &[&str]) -> Result<CommandOutput, CommandError> {
    process::run("git", args, repo)
}

pub fn validate_branch_name(branch: &str) -> anyhow::Result<()> {
    if branch.is_empty()
        || branch.contains('\0')
        || branch.contains('\n')
        || branch.contains(char::is_whitespace)
        || branch.starts_with('-')
    {
        anyhow::bail!("Invalid branch name: {:?}", branch);
    }
    Ok(())
}

/// Machine-readable status; `None` means the working tree is clean.
pub fn status_porcelain(repo: &Path) -> Result<Option<String>, CommandError> {
    let output = run_git(repo, &["status", "--porcelain"])?;
    Ok(output.text().map(str::to_string))
}

pub fn local_branches(repo: &Path) -> Result<Vec<String>, CommandError> {
    let output = run_git(repo, &["branch"])?;
    Ok(parse_branch_list(&output.stdout))
}

/// Parses `git branch` output, dropping the current (`*`) and
/// checked-out-in-another-worktree (`+`) markers.
#[must_use]
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim_start().trim_start_matches(['*', '+']).trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn create_branch(repo: &Path, branch: &str) -> Result<CommandOutput, CommandError> {
    run_git(repo, &["checkout", "-b", branch])
}

pub fn add(repo: &Path, file: &Path) -> Result<CommandOutput, CommandError> {
    let file = file.to_string_lossy();
    run_git(repo, &["add", file.as_ref()])
}

pub fn commit(repo: &Path, message: &str) -> Result<CommandOutput, CommandError> {
    run_git(repo, &["commit", "-m", message])
}

pub fn push(repo: &Path, remote: &str, branch: &str) -> Result<CommandOutput, CommandError> {
    run_git(repo, &["push", remote, branch])
}

pub fn remote_verbose(repo: &Path) -> Result<String, CommandError> {
    run_git(repo, &["remote", "--verbose"]).map(|output| output.stdout)
}
