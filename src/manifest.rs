//! Reading, rewriting and writing `package.json`.
//!
//! The rewrite keeps each range's operator prefix (`^`, `~`, `>=`) and only
//! swaps the version after it, so the author's pinning style survives.

use crate::npm::OutdatedReport;
use anyhow::Context;
use serde_json::Value;
use std::path::Path;

/// Characters allowed in front of the numeric part of a range.
const RANGE_PREFIX_CHARS: &[char] = &['^', '~', '>', '<', '=', 'v', ' '];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub name: String,
    pub group: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenManifest {
    pub manifest: Value,
    pub bumps: Vec<VersionBump>,
}

pub fn load(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Two-space indented JSON in the original key order, newline terminated.
pub fn render(manifest: &Value) -> anyhow::Result<String> {
    let mut text = serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")?;
    text.push('\n');
    Ok(text)
}

pub fn write(path: &Path, manifest: &Value) -> anyhow::Result<()> {
    let text = render(manifest)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Replaces the numeric part of `range` with `version`.
///
/// Returns `None` for ranges without a plain numeric version (dist-tags,
/// URLs, `*`), which are left alone, and for targets such as `linked` or
/// `git` that npm reports for non-registry dependencies.
#[must_use]
pub fn replace_version(range: &str, version: &str) -> Option<String> {
    if !version.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let digits_at = range.find(|c: char| c.is_ascii_digit())?;
    let prefix = &range[..digits_at];
    if !prefix.chars().all(|c| RANGE_PREFIX_CHARS.contains(&c)) {
        return None;
    }
    Some(format!("{}{}", prefix, version))
}

/// Applies `report` to `manifest`, skipping dependencies already at their target.
#[must_use]
pub fn rewrite(mut manifest: Value, report: &OutdatedReport, use_latest: bool) -> RewrittenManifest {
    let mut bumps = Vec::new();

    for (name, dependency) in report {
        if dependency.is_current(use_latest) {
            continue;
        }
        let target = dependency.target(use_latest);

        let Some(slot) = manifest
            .get_mut(&dependency.kind)
            .and_then(|group| group.get_mut(name))
        else {
            continue;
        };
        let Some(range) = slot.as_str() else {
            continue;
        };
        let Some(updated) = replace_version(range, target) else {
            continue;
        };
        if updated == range {
            continue;
        }

        bumps.push(VersionBump {
            name: name.clone(),
            group: dependency.kind.clone(),
            from: range.to_string(),
            to: updated.clone(),
        });
        *slot = Value::String(updated);
    }

    RewrittenManifest { manifest, bumps }
}
