//! Resolving the hosting owner and repository from git remote metadata.

use anyhow::{Context, anyhow, bail};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    pub url: String,
    pub owner: String,
    pub repository: String,
}

/// Finds the push URL of `remote` in `git remote --verbose` output.
#[must_use]
pub fn find_push_url(listing: &str, remote: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let name = fields.next()?;
        let url = fields.next()?;
        let kind = fields.next()?;
        (name == remote && kind == "(push)").then(|| url.to_string())
    })
}

/// Parses a push URL into owner and repository name.
///
/// Accepts regular URLs (`https://`, `ssh://`, `file://`) and the scp-like
/// `[user@]host:owner/repo.git` form.
pub fn parse_remote_url(raw: &str) -> anyhow::Result<RemoteInfo> {
    // `host:owner/repo` parses as a URL with scheme `host` and no base.
    let url = Url::parse(raw)
        .ok()
        .filter(|url| !url.cannot_be_a_base())
        .map_or_else(
            || Url::parse(&scp_to_ssh(raw)?).map_err(anyhow::Error::from),
            Ok,
        )
        .with_context(|| format!("Unrecognized remote URL '{}'", raw))?;

    let mut segments: Vec<&str> = url
        .path_segments()
        .ok_or_else(|| anyhow!("Remote URL '{}' has no path", raw))?
        .filter(|s| !s.is_empty())
        .collect();

    let repository = segments
        .pop()
        .map(|s| s.strip_suffix(".git").unwrap_or(s))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Remote URL '{}' does not name a repository", raw))?;
    let owner = segments
        .pop()
        .ok_or_else(|| anyhow!("Remote URL '{}' does not name an owner", raw))?;

    Ok(RemoteInfo {
        url: raw.to_string(),
        owner: owner.to_string(),
        repository: repository.to_string(),
    })
}

fn scp_to_ssh(raw: &str) -> anyhow::Result<String> {
    let Some((host, path)) = raw.split_once(':') else {
        bail!("not an scp-style address");
    };
    if host.is_empty() || host.contains('/') || path.starts_with("//") {
        bail!("not an scp-style address");
    }
    Ok(format!("ssh://{}/{}", host, path.trim_start_matches('/')))
}
