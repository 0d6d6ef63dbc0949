use anyhow::Context;
use clap::Parser;
use git_dep_bump::config::{Config, Options, Verbosity};
use git_dep_bump::constants::{
    DEFAULT_API_URL, DEFAULT_BASE_BRANCH, DEFAULT_BRANCH, DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE,
    RAYON_THREAD_COUNT,
};
use git_dep_bump::github::{Credentials, GitHub};
use git_dep_bump::npm::Npm;
use git_dep_bump::output::{self, ConsoleCallbacks};
use git_dep_bump::pipeline::{self, Collaborators};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Update npm dependencies in git repositories and open pull requests.
#[derive(Parser, Debug)]
#[command(name = "git-dep-bump", version)]
struct Cli {
    /// Repositories to update (defaults to the current directory)
    directories: Vec<PathBuf>,

    /// Branch to create for the update
    #[arg(short, long, default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Commit message, also used as the pull request title
    #[arg(short, long, default_value = DEFAULT_COMMIT_MESSAGE)]
    message: String,

    /// Remote to push the branch to
    #[arg(short, long, default_value = DEFAULT_REMOTE)]
    remote: String,

    /// Branch the pull request targets
    #[arg(long, default_value = DEFAULT_BASE_BRANCH)]
    base: String,

    /// Only report what would change
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Pin the latest published version instead of the wanted one
    #[arg(short, long)]
    latest: bool,

    /// Push the branch without opening a pull request
    #[arg(long)]
    no_pull_request: bool,

    /// Hosting username (defaults to the remote's owner)
    #[arg(short, long)]
    username: Option<String>,

    /// Hosting password or token
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    password: Option<String>,

    /// Hosting API endpoint
    #[arg(long, env = "GIT_DEP_BUMP_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Only print failures
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print every step and git's output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Config { verbosity }
    }

    fn options(&self) -> Options {
        Options {
            branch: self.branch.clone(),
            message: self.message.clone(),
            remote: self.remote.clone(),
            base: self.base.clone(),
            dry_run: self.dry_run,
            use_latest: self.latest,
            merge_request: !self.no_pull_request,
            credentials: Credentials {
                username: self.username.clone(),
                password: self.password.clone(),
            },
        }
    }
}

fn prompt_password(options: &mut Options) -> anyhow::Result<()> {
    if options.dry_run
        || !options.merge_request
        || options.credentials.password.is_some()
        || !std::io::stdin().is_terminal()
    {
        return Ok(());
    }
    let password = dialoguer::Password::new()
        .with_prompt("GitHub password or token")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read password")?;
    options.credentials.password = Some(password).filter(|p| !p.is_empty());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    let mut options = cli.options();

    let directories = if cli.directories.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        cli.directories.clone()
    };

    prompt_password(&mut options)?;

    // Ignore the error if a global pool already exists
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(RAYON_THREAD_COUNT)
        .build_global();

    let npm = Npm::default();
    let hosting = GitHub::new(&cli.api_url)?;
    let callbacks = ConsoleCallbacks::new(config);
    let env = Collaborators {
        package_manager: &npm,
        hosting: &hosting,
        callbacks: &callbacks,
    };

    output::print_working_dirs(&directories, &config);
    pipeline::run_batch(&directories, &options, &env);
    output::print_success(&config);

    Ok(())
}
