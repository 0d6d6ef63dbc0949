//! Test infrastructure for git-dep-bump integration tests.
#![allow(dead_code)]

use anyhow::Result;
use git_dep_bump::github::{HostingApi, MergeRequest, MergeRequestResult};
use git_dep_bump::npm::PackageManager;
use git_dep_bump::pipeline::{Collaborators, PipelineCallbacks, RepoContext, Stage, StageError};
use git_dep_bump::process::CommandError;
use git_dep_bump::git::run_git;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const MANIFEST: &str = r#"{
  "name": "widgets",
  "version": "1.0.0",
  "dependencies": {
    "left-pad": "^1.2.0"
  },
  "devDependencies": {
    "mocha": "~10.1.0"
  }
}
"#;

pub const OUTDATED_REPORT: &str = r#"{
  "left-pad": {
    "current": "1.2.0",
    "wanted": "1.3.0",
    "latest": "2.0.0",
    "type": "dependencies"
  },
  "mocha": {
    "current": "10.1.0",
    "wanted": "10.1.2",
    "latest": "10.4.0",
    "type": "devDependencies"
  }
}"#;

/// A temporary git repository with a committed `package.json`.
/// Automatically cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    _remote_dir: Option<TempDir>,
    path: PathBuf,
    remote_path: Option<PathBuf>,
}

impl TestRepo {
    /// Creates a repository with an initial commit on the master branch.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("widgets");
        init_repo(&path)?;

        Ok(Self {
            _temp_dir: temp_dir,
            _remote_dir: None,
            path,
            remote_path: None,
        })
    }

    /// Creates a repository whose `origin` is a bare repository at
    /// `<tmp>/acme/widgets.git`, addressed with a `file://` URL so the
    /// owner and repository name can be resolved from it.
    pub fn with_remote() -> Result<Self> {
        let mut repo = Self::new()?;
        let remote_dir = TempDir::new()?;
        let remote_path = remote_dir.path().join("acme").join("widgets.git");
        std::fs::create_dir_all(&remote_path)?;
        run_git(&remote_path, &["init", "--bare"])?;

        let url = url::Url::from_file_path(&remote_path)
            .map_err(|_| anyhow::anyhow!("bad remote path {}", remote_path.display()))?;
        run_git(&repo.path, &["remote", "add", "origin", url.as_str()])?;
        run_git(&repo.path, &["push", "-u", "origin", "master"])?;

        repo._remote_dir = Some(remote_dir);
        repo.remote_path = Some(remote_path);
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.path.join("package.json"))?)
    }

    pub fn make_dirty(&self) -> Result<()> {
        std::fs::write(self.path.join("README.md"), "# Modified\n")?;
        Ok(())
    }

    pub fn create_branch(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["branch", name])?;
        Ok(())
    }

    pub fn current_branch(&self) -> Result<String> {
        let output = run_git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(output.stdout.trim().to_string())
    }

    pub fn has_branch(&self, name: &str) -> Result<bool> {
        let output = run_git(&self.path, &["branch", "--list", name])?;
        Ok(!output.stdout.trim().is_empty())
    }

    pub fn last_commit_message(&self) -> Result<String> {
        let output = run_git(&self.path, &["log", "-1", "--format=%s"])?;
        Ok(output.stdout.trim().to_string())
    }

    pub fn remote_has_branch(&self, name: &str) -> Result<bool> {
        let Some(remote) = &self.remote_path else {
            return Ok(false);
        };
        let output = run_git(remote, &["branch", "--list", name])?;
        Ok(!output.stdout.trim().is_empty())
    }
}

pub fn init_repo(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    run_git(path, &["init", "-b", "master"])?;
    run_git(path, &["config", "user.email", "test@example.com"])?;
    run_git(path, &["config", "user.name", "Test User"])?;
    run_git(path, &["config", "commit.gpgsign", "false"])?;

    std::fs::write(path.join("README.md"), "# Test Repo\n")?;
    std::fs::write(path.join("package.json"), MANIFEST)?;
    run_git(path, &["add", "README.md", "package.json"])?;
    run_git(path, &["commit", "-m", "Initial commit"])?;
    Ok(())
}

/// Package manager returning a canned report and counting queries.
pub struct FakePackageManager {
    result: std::result::Result<Option<String>, i32>,
    calls: AtomicUsize,
}

impl FakePackageManager {
    pub fn reporting(report: &str) -> Self {
        Self {
            result: Ok(Some(report.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn up_to_date() -> Self {
        Self {
            result: Ok(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            result: Err(code),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PackageManager for FakePackageManager {
    fn outdated(&self, _dir: &Path) -> std::result::Result<Option<String>, CommandError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(report) => Ok(report.clone()),
            Err(code) => Err(CommandError::Exit {
                command: "npm outdated --long --json".to_string(),
                code: Some(*code),
                stdout: "{\"should\": \"not leak\"}".to_string(),
                stderr: "npm ERR! broken\n".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub owner: String,
    pub repository: String,
    pub title: String,
    pub base: String,
    pub head: String,
}

/// Hosting API that records requests instead of calling a server.
#[derive(Default)]
pub struct FakeHosting {
    pub fail: bool,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeHosting {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HostingApi for FakeHosting {
    fn create_merge_request(&self, request: &MergeRequest<'_>) -> Result<MergeRequestResult> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            username: request.credentials.username.clone(),
            password: request.credentials.password.clone(),
            owner: request.owner.to_string(),
            repository: request.repository.to_string(),
            title: request.title.to_string(),
            base: request.base.to_string(),
            head: request.head.to_string(),
        });
        if self.fail {
            anyhow::bail!("Validation Failed: a pull request already exists");
        }
        Ok(MergeRequestResult {
            number: requests.len() as u64,
            html_url: format!(
                "https://github.com/{}/{}/pull/{}",
                request.owner,
                request.repository,
                requests.len()
            ),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StageBegin(Stage),
    Step(PathBuf, Stage),
    Dropped(Dropped),
    DryRun(PathBuf),
    MergeRequest(PathBuf, u64),
    StageEnd(Stage, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropped {
    pub directory: PathBuf,
    pub stage: Stage,
    pub benign: bool,
    pub exit_code: Option<i32>,
    pub message: String,
}

/// Captures everything the pipeline reports.
#[derive(Default)]
pub struct RecordingCallbacks {
    events: Mutex<Vec<Event>>,
}

impl RecordingCallbacks {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn dropped(&self) -> Vec<Dropped> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Dropped(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn steps_for(&self, directory: &Path) -> Vec<Stage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Step(dir, stage) if dir == directory => Some(stage),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl PipelineCallbacks for RecordingCallbacks {
    fn on_stage_begin(&self, stage: Stage, _repos: usize) {
        self.push(Event::StageBegin(stage));
    }

    fn on_step(&self, directory: &Path, stage: Stage) {
        self.push(Event::Step(directory.to_path_buf(), stage));
    }

    fn on_dropped(&self, directory: &Path, stage: Stage, error: &StageError) {
        self.push(Event::Dropped(Dropped {
            directory: directory.to_path_buf(),
            stage,
            benign: error.is_benign(),
            exit_code: error.exit_code(),
            message: error.to_string(),
        }));
    }

    fn on_dry_run(&self, context: &RepoContext) {
        self.push(Event::DryRun(context.directory.clone()));
    }

    fn on_merge_request(&self, directory: &Path, result: &MergeRequestResult) {
        self.push(Event::MergeRequest(directory.to_path_buf(), result.number));
    }

    fn on_stage_end(&self, stage: Stage, survivors: usize) {
        self.push(Event::StageEnd(stage, survivors));
    }
}

pub fn collaborators<'a>(
    package_manager: &'a FakePackageManager,
    hosting: &'a FakeHosting,
    callbacks: &'a RecordingCallbacks,
) -> Collaborators<'a> {
    Collaborators {
        package_manager,
        hosting,
        callbacks,
    }
}
