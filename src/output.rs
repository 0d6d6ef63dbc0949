//! Progress bars, colored output, and per-stage reporting.
//!
//! This module provides the console implementation of [`PipelineCallbacks`]
//! plus a no-op implementation for callers that want silence.

use crate::config::Config;
use crate::constants::PROGRESS_TICK_MS;
use crate::github::MergeRequestResult;
use crate::pipeline::{PipelineCallbacks, RepoContext, Stage, StageError, repo_name};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
/// This is the null object pattern for PipelineCallbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl PipelineCallbacks for NoOpCallbacks {
    fn on_dropped(&self, _directory: &Path, _stage: Stage, _error: &StageError) {}
}

/// Console reporter.
///
/// Quiet mode prints failures only. Normal mode adds a progress bar per
/// stage and the per-repository results. Verbose mode replaces the bar with
/// one line per step and echoes git output.
pub struct ConsoleCallbacks {
    config: Config,
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleCallbacks {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            bar: Mutex::new(None),
        }
    }

    fn shows_progress(&self) -> bool {
        !self.config.is_quiet() && !self.config.is_verbose()
    }

    /// Prints above the progress bar when one is active.
    fn emit(&self, line: String, is_error: bool) {
        let bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        let print = || {
            if is_error {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        };
        match bar.as_ref() {
            Some(bar) => bar.suspend(print),
            None => print(),
        }
    }
}

impl PipelineCallbacks for ConsoleCallbacks {
    fn on_stage_begin(&self, stage: Stage, repos: usize) {
        if self.config.is_verbose() {
            eprintln!(
                "\n{} {}",
                format!("[{}]", stage).white().bold(),
                format!("({} repositories)", repos).dimmed()
            );
            return;
        }
        if !self.shows_progress() {
            return;
        }

        let bar = ProgressBar::new(repos as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {msg} {bar:30.cyan/blue} {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█░"),
        );
        bar.set_message(format_stage_message(stage));
        bar.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));

        *self.bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
    }

    fn on_step(&self, directory: &Path, stage: Stage) {
        if self.config.is_verbose() {
            eprintln!(
                "  {} {}...",
                repo_name(directory).white(),
                stage.to_string().dimmed()
            );
        }
    }

    fn on_output(&self, directory: &Path, text: &str) {
        if !self.config.is_verbose() || text.is_empty() {
            return;
        }
        for line in text.lines() {
            eprintln!("    {} {}", format!("{}:", repo_name(directory)).dimmed(), line);
        }
    }

    fn on_settled(&self, _directory: &Path, _stage: Stage) {
        if let Some(bar) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            bar.inc(1);
        }
    }

    fn on_dropped(&self, directory: &Path, stage: Stage, error: &StageError) {
        if error.is_benign() {
            if !self.config.is_quiet() {
                self.emit(
                    format!("{} {}: {}", "•".yellow(), repo_name(directory), error),
                    false,
                );
            }
            return;
        }

        let mut line = format!(
            "{} {} failed at {}: {}",
            "✗".red(),
            directory.display().to_string().white().bold(),
            stage,
            error.to_string().red()
        );
        if let StageError::Command(command) = error {
            for detail in command.stderr().lines().filter(|l| !l.trim().is_empty()) {
                line.push_str(&format!("\n    {}", detail.dimmed()));
            }
        }
        self.emit(line, true);
    }

    fn on_dry_run(&self, context: &RepoContext) {
        if self.config.is_quiet() {
            return;
        }
        let Some(rewritten) = &context.rewritten else {
            return;
        };

        let mut report = format!(
            "{} {} {}",
            "Dry run:".cyan(),
            context.directory.display().to_string().white().bold(),
            format!("would commit to '{}'", context.branch).dimmed()
        );
        for bump in &rewritten.bumps {
            report.push_str(&format!(
                "\n  {} {} {} → {}",
                format!("[{}]", bump.group).dimmed(),
                bump.name,
                bump.from.red(),
                bump.to.green()
            ));
        }
        self.emit(report, false);
    }

    fn on_merge_request(&self, directory: &Path, result: &MergeRequestResult) {
        self.emit(
            format!(
                "{} {} opened pull request #{} {}",
                "✓".green(),
                repo_name(directory),
                result.number,
                result.html_url.cyan()
            ),
            false,
        );
    }

    fn on_stage_end(&self, _stage: Stage, _survivors: usize) {
        if let Some(bar) = self.bar.lock().unwrap_or_else(|e| e.into_inner()).take() {
            bar.finish_and_clear();
        }
    }
}

pub fn print_working_dirs(directories: &[std::path::PathBuf], config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Updating dependencies in".cyan(),
        format!("{} repositories", directories.len()).white().bold()
    );
}

pub fn print_success(config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!("{}", "Success!".green().bold());
}

fn format_stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Configuring => "Preparing repositories...",
        Stage::CheckingWorkingTree => "Checking for pending changes...",
        Stage::CheckingBranch => "Checking for existing branch...",
        Stage::QueryingOutdated => "Querying outdated dependencies...",
        Stage::RewritingManifest => "Rewriting package.json...",
        Stage::ReportingDryRun => "Reporting planned updates...",
        Stage::PersistingManifest => "Writing package.json...",
        Stage::ResolvingRemote => "Resolving remote...",
        Stage::CreatingBranch => "Creating branch...",
        Stage::StagingFiles => "Staging updated files...",
        Stage::Committing => "Committing staged files...",
        Stage::Pushing => "Pushing branch to remote...",
        Stage::CreatingMergeRequest => "Creating pull request...",
    }
}
