//! npm integration: the outdated-dependency report.

use crate::process::{self, CommandError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One entry of `npm outdated --long --json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutdatedDependency {
    /// Absent when the dependency is declared but not installed.
    #[serde(default)]
    pub current: Option<String>,
    pub wanted: String,
    pub latest: String,
    /// Manifest group the dependency is declared in, e.g. `devDependencies`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl OutdatedDependency {
    /// The version to pin: `latest` when requested, otherwise npm's `wanted`.
    #[must_use]
    pub fn target(&self, use_latest: bool) -> &str {
        if use_latest { &self.latest } else { &self.wanted }
    }

    #[must_use]
    pub fn is_current(&self, use_latest: bool) -> bool {
        self.current.as_deref() == Some(self.target(use_latest))
    }
}

pub type OutdatedReport = BTreeMap<String, OutdatedDependency>;

/// Parses the JSON report. Blank output and `{}` both mean nothing is outdated.
pub fn parse_report(raw: Option<&str>) -> Result<Option<OutdatedReport>, serde_json::Error> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };
    let report: OutdatedReport = serde_json::from_str(raw)?;
    Ok((!report.is_empty()).then_some(report))
}

/// Source of outdated-dependency reports for a repository.
pub trait PackageManager: Sync {
    /// Raw structured report for the direct dependencies of `dir`, or `None`
    /// when the tool printed nothing.
    fn outdated(&self, dir: &Path) -> Result<Option<String>, CommandError>;
}

/// The `npm` binary, looked up on `PATH` unless another program is given.
#[derive(Debug, Clone)]
pub struct Npm {
    program: String,
}

impl Default for Npm {
    fn default() -> Self {
        Self::with_program("npm")
    }
}

impl Npm {
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// npm exits with this code when it found outdated packages.
const NPM_OUTDATED_FOUND: i32 = 1;

impl PackageManager for Npm {
    fn outdated(&self, dir: &Path) -> Result<Option<String>, CommandError> {
        match process::run(&self.program, &["outdated", "--long", "--json"], dir) {
            Ok(output) => Ok(output.text().map(str::to_string)),
            // npm also exits 1 on its own errors, printing `{"error": ...}`.
            Err(CommandError::Exit {
                code: Some(NPM_OUTDATED_FOUND),
                stdout,
                ..
            }) if parse_report(Some(&stdout)).is_ok() => Ok(Some(stdout)),
            Err(e) => Err(e),
        }
    }
}
