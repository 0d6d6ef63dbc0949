//! The individual pipeline stages.
//!
//! Each stage reads the context, performs one external operation, and
//! records its own result on the context. Returning an error drops the
//! repository from the batch.

use crate::git;
use crate::github::MergeRequest;
use crate::manifest;
use crate::npm;
use crate::pipeline::{Collaborators, RepoContext, Stage, StageError};
use crate::remote;

pub(crate) fn run(
    stage: Stage,
    context: &mut RepoContext,
    env: &Collaborators<'_>,
) -> Result<(), StageError> {
    match stage {
        // Contexts are built before the first stage runs.
        Stage::Configuring => Ok(()),
        Stage::CheckingWorkingTree => check_working_tree(context),
        Stage::CheckingBranch => check_branch_absent(context),
        Stage::QueryingOutdated => query_outdated(context, env),
        Stage::RewritingManifest => rewrite_manifest(context),
        Stage::ReportingDryRun => {
            env.callbacks.on_dry_run(context);
            Ok(())
        }
        Stage::PersistingManifest => persist_manifest(context),
        Stage::ResolvingRemote => resolve_remote(context),
        Stage::CreatingBranch => create_branch(context, env),
        Stage::StagingFiles => stage_files(context),
        Stage::Committing => commit_changes(context, env),
        Stage::Pushing => push_branch(context, env),
        Stage::CreatingMergeRequest => create_merge_request(context, env),
    }
}

fn missing(what: &str, context: &RepoContext) -> StageError {
    StageError::Validation(format!(
        "No {} recorded for '{}'",
        what,
        context.directory.display()
    ))
}

fn check_working_tree(context: &mut RepoContext) -> Result<(), StageError> {
    if let Some(status) = git::status_porcelain(&context.directory)? {
        return Err(StageError::Validation(format!(
            "There are pending changes in '{}'. Please stash your changes first.\n{}",
            context.directory.display(),
            status.trim_end()
        )));
    }
    Ok(())
}

fn check_branch_absent(context: &mut RepoContext) -> Result<(), StageError> {
    let branches = git::local_branches(&context.directory)?;
    if branches.iter().any(|b| *b == context.branch) {
        return Err(StageError::Validation(format!(
            "Branch '{}' already exists in '{}'",
            context.branch,
            context.directory.display()
        )));
    }
    Ok(())
}

fn query_outdated(context: &mut RepoContext, env: &Collaborators<'_>) -> Result<(), StageError> {
    let raw = env.package_manager.outdated(&context.directory)?;
    let report = npm::parse_report(raw.as_deref()).map_err(|e| {
        StageError::Validation(format!("Unable to parse the outdated report: {}", e))
    })?;

    match report {
        Some(report) => {
            context.outdated = Some(report);
            Ok(())
        }
        None => Err(StageError::UpToDate(
            "Dependencies are up to date".to_string(),
        )),
    }
}

fn rewrite_manifest(context: &mut RepoContext) -> Result<(), StageError> {
    let report = context
        .outdated
        .as_ref()
        .ok_or_else(|| missing("outdated report", context))?;
    let current = manifest::load(&context.manifest_path).map_err(StageError::Io)?;

    let rewritten = manifest::rewrite(current, report, context.use_latest);
    if rewritten.bumps.is_empty() {
        return Err(StageError::UpToDate(
            "Manifest already pins the available versions".to_string(),
        ));
    }

    context.rewritten = Some(rewritten);
    Ok(())
}

fn persist_manifest(context: &mut RepoContext) -> Result<(), StageError> {
    let rewritten = context
        .rewritten
        .as_ref()
        .ok_or_else(|| missing("rewritten manifest", context))?;
    manifest::write(&context.manifest_path, &rewritten.manifest).map_err(StageError::Io)
}

fn resolve_remote(context: &mut RepoContext) -> Result<(), StageError> {
    let listing = git::remote_verbose(&context.directory)?;
    let url = remote::find_push_url(&listing, &context.remote).ok_or_else(|| {
        StageError::Validation(format!(
            "Remote '{}' has no push URL in '{}'",
            context.remote,
            context.directory.display()
        ))
    })?;
    let info =
        remote::parse_remote_url(&url).map_err(|e| StageError::Validation(format!("{:#}", e)))?;

    if context.credentials.username.is_none() {
        context.credentials.username = Some(info.owner.clone());
    }
    context.remote_info = Some(info);
    Ok(())
}

fn create_branch(context: &mut RepoContext, env: &Collaborators<'_>) -> Result<(), StageError> {
    let output = git::create_branch(&context.directory, &context.branch)?;
    if !output.has_any_output() {
        return Err(StageError::Validation(format!(
            "Unable to create branch '{}': git printed no confirmation",
            context.branch
        )));
    }
    env.callbacks
        .on_output(&context.directory, output.stderr.trim());
    Ok(())
}

fn stage_files(context: &mut RepoContext) -> Result<(), StageError> {
    let relative = context
        .manifest_path
        .strip_prefix(&context.directory)
        .unwrap_or(&context.manifest_path);
    git::add(&context.directory, relative)?;
    Ok(())
}

fn commit_changes(context: &mut RepoContext, env: &Collaborators<'_>) -> Result<(), StageError> {
    let output = git::commit(&context.directory, &context.message)?;
    let Some(summary) = output.text() else {
        return Err(StageError::Validation(
            "Unable to commit files: git printed no confirmation".to_string(),
        ));
    };
    env.callbacks.on_output(&context.directory, summary.trim());
    Ok(())
}

fn push_branch(context: &mut RepoContext, env: &Collaborators<'_>) -> Result<(), StageError> {
    let output = git::push(&context.directory, &context.remote, &context.branch)?;
    env.callbacks
        .on_output(&context.directory, output.stderr.trim());
    Ok(())
}

fn create_merge_request(
    context: &mut RepoContext,
    env: &Collaborators<'_>,
) -> Result<(), StageError> {
    let info = context
        .remote_info
        .as_ref()
        .ok_or_else(|| missing("remote metadata", context))?;

    let result = env
        .hosting
        .create_merge_request(&MergeRequest {
            credentials: &context.credentials,
            owner: &info.owner,
            repository: &info.repository,
            title: &context.message,
            base: &context.base,
            head: &context.branch,
        })
        .map_err(StageError::Remote)?;

    env.callbacks.on_merge_request(&context.directory, &result);
    context.merge_request = Some(result);
    Ok(())
}
