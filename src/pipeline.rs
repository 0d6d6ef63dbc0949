// Repository contexts, stage list, and the batch driver

use crate::config::Options;
use crate::constants::{DEFAULT_REPO_NAME, MANIFEST_FILE};
use crate::git;
use crate::github::{Credentials, HostingApi, MergeRequestResult};
use crate::manifest::RewrittenManifest;
use crate::npm::{OutdatedReport, PackageManager};
use crate::process::CommandError;
use crate::remote::RemoteInfo;
use crate::stages;
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Configuring,
    CheckingWorkingTree,
    CheckingBranch,
    QueryingOutdated,
    RewritingManifest,
    ReportingDryRun,
    PersistingManifest,
    ResolvingRemote,
    CreatingBranch,
    StagingFiles,
    Committing,
    Pushing,
    CreatingMergeRequest,
}

impl Stage {
    /// True for stages that change the repository or the hosting service.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Stage::PersistingManifest
                | Stage::CreatingBranch
                | Stage::StagingFiles
                | Stage::Committing
                | Stage::Pushing
                | Stage::CreatingMergeRequest
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuring => "configuring",
            Stage::CheckingWorkingTree => "checking working tree",
            Stage::CheckingBranch => "checking branch",
            Stage::QueryingOutdated => "querying outdated dependencies",
            Stage::RewritingManifest => "rewriting manifest",
            Stage::ReportingDryRun => "reporting dry run",
            Stage::PersistingManifest => "writing manifest",
            Stage::ResolvingRemote => "resolving remote",
            Stage::CreatingBranch => "creating branch",
            Stage::StagingFiles => "staging files",
            Stage::Committing => "committing",
            Stage::Pushing => "pushing",
            Stage::CreatingMergeRequest => "creating pull request",
        };
        f.write_str(name)
    }
}

/// Why a repository left the batch.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("{0}")]
    Validation(String),
    /// Nothing to update. A normal end state, not a failure.
    #[error("{0}")]
    UpToDate(String),
    #[error("{0:#}")]
    Remote(anyhow::Error),
    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl StageError {
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, StageError::UpToDate(_))
    }

    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StageError::Command(e) => e.exit_code(),
            _ => None,
        }
    }
}

/// Per-repository working record threaded through the stages.
///
/// Configuration fields are fixed at creation. Every `Option` field is filled
/// by exactly one stage.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub directory: PathBuf,
    pub manifest_path: PathBuf,
    pub branch: String,
    pub message: String,
    pub remote: String,
    pub base: String,
    pub use_latest: bool,
    pub credentials: Credentials,
    pub outdated: Option<OutdatedReport>,
    pub rewritten: Option<RewrittenManifest>,
    pub remote_info: Option<RemoteInfo>,
    pub merge_request: Option<MergeRequestResult>,
}

impl RepoContext {
    pub fn new(directory: &Path, options: &Options) -> Result<Self, StageError> {
        let directory = std::path::absolute(directory).map_err(|e| {
            StageError::Validation(format!(
                "Unable to resolve '{}': {}",
                directory.display(),
                e
            ))
        })?;
        git::validate_branch_name(&options.branch)
            .map_err(|e| StageError::Validation(e.to_string()))?;

        Ok(Self {
            manifest_path: directory.join(MANIFEST_FILE),
            directory,
            branch: options.branch.clone(),
            message: options.message.clone(),
            remote: options.remote.clone(),
            base: options.base.clone(),
            use_latest: options.use_latest,
            credentials: options.credentials.clone(),
            outdated: None,
            rewritten: None,
            remote_info: None,
            merge_request: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        repo_name(&self.directory)
    }
}

#[must_use]
pub fn repo_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_REPO_NAME)
}

/// Observability sink handed to every stage.
///
/// Calls for one stage arrive from several threads at once.
pub trait PipelineCallbacks: Sync {
    fn on_stage_begin(&self, _stage: Stage, _repos: usize) {}
    fn on_step(&self, _directory: &Path, _stage: Stage) {}
    /// Output of an external command worth echoing.
    fn on_output(&self, _directory: &Path, _text: &str) {}
    fn on_dropped(&self, directory: &Path, stage: Stage, error: &StageError);
    /// The repository finished `stage`, whether it survived or not.
    fn on_settled(&self, _directory: &Path, _stage: Stage) {}
    fn on_dry_run(&self, _context: &RepoContext) {}
    fn on_merge_request(&self, _directory: &Path, _result: &MergeRequestResult) {}
    fn on_stage_end(&self, _stage: Stage, _survivors: usize) {}
}

/// External collaborators and the sink, shared by every stage.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub package_manager: &'a dyn PackageManager,
    pub hosting: &'a dyn HostingApi,
    pub callbacks: &'a dyn PipelineCallbacks,
}

/// An ordered list of stages applied batch-wide, one stage at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    #[must_use]
    pub fn for_options(options: &Options) -> Self {
        let mut stages = vec![
            Stage::CheckingWorkingTree,
            Stage::CheckingBranch,
            Stage::QueryingOutdated,
            Stage::RewritingManifest,
        ];

        if options.dry_run {
            stages.push(Stage::ReportingDryRun);
            return Self::new(stages);
        }

        stages.push(Stage::PersistingManifest);
        if options.merge_request {
            stages.push(Stage::ResolvingRemote);
        }
        stages.extend([
            Stage::CreatingBranch,
            Stage::StagingFiles,
            Stage::Committing,
            Stage::Pushing,
        ]);
        if options.merge_request {
            stages.push(Stage::CreatingMergeRequest);
        }
        Self::new(stages)
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs every stage over the live contexts and returns those that
    /// completed all of them.
    pub fn run(&self, contexts: Vec<RepoContext>, env: &Collaborators<'_>) -> Vec<RepoContext> {
        self.stages
            .iter()
            .fold(contexts, |live, &stage| run_stage(stage, live, env))
    }
}

fn run_stage(stage: Stage, live: Vec<RepoContext>, env: &Collaborators<'_>) -> Vec<RepoContext> {
    if live.is_empty() {
        return live;
    }
    env.callbacks.on_stage_begin(stage, live.len());

    let survivors: Vec<RepoContext> = live
        .into_par_iter()
        .filter_map(|mut context| {
            env.callbacks.on_step(&context.directory, stage);
            let outcome = stages::run(stage, &mut context, env);
            env.callbacks.on_settled(&context.directory, stage);
            match outcome {
                Ok(()) => Some(context),
                Err(e) => {
                    env.callbacks.on_dropped(&context.directory, stage, &e);
                    None
                }
            }
        })
        .collect();

    env.callbacks.on_stage_end(stage, survivors.len());
    survivors
}

/// Builds a context per directory and drives them through the pipeline
/// selected by `options`.
pub fn run_batch(
    directories: &[PathBuf],
    options: &Options,
    env: &Collaborators<'_>,
) -> Vec<RepoContext> {
    let contexts = directories
        .iter()
        .filter_map(|directory| match RepoContext::new(directory, options) {
            Ok(context) => Some(context),
            Err(e) => {
                env.callbacks
                    .on_dropped(directory, Stage::Configuring, &e);
                None
            }
        })
        .collect();

    Pipeline::for_options(options).run(contexts, env)
}
