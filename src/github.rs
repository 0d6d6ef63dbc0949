//! Pull request creation on the hosting service.

use crate::constants::USER_AGENT;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Everything needed to open a pull request.
#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    pub credentials: &'a Credentials,
    pub owner: &'a str,
    pub repository: &'a str,
    pub title: &'a str,
    pub base: &'a str,
    pub head: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MergeRequestResult {
    pub number: u64,
    pub html_url: String,
}

pub trait HostingApi: Sync {
    fn create_merge_request(&self, request: &MergeRequest<'_>) -> Result<MergeRequestResult>;
}

#[derive(Serialize)]
struct CreatePullBody<'a> {
    title: &'a str,
    base: &'a str,
    head: &'a str,
}

/// GitHub REST v3 client.
pub struct GitHub {
    client: Client,
    api_url: String,
}

impl GitHub {
    pub fn new(api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

impl HostingApi for GitHub {
    fn create_merge_request(&self, request: &MergeRequest<'_>) -> Result<MergeRequestResult> {
        let url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_url, request.owner, request.repository
        );
        let mut call = self.client.post(&url).json(&CreatePullBody {
            title: request.title,
            base: request.base,
            head: request.head,
        });
        match request.credentials {
            Credentials {
                username: Some(username),
                password,
            } => call = call.basic_auth(username, password.as_deref()),
            Credentials {
                username: None,
                password: Some(token),
            } => call = call.bearer_auth(token),
            _ => {}
        }

        let result = call
            .send()
            .with_context(|| format!("POST {} failed", url))?
            .error_for_status()
            .with_context(|| {
                format!(
                    "GitHub refused to open a pull request for {}/{}",
                    request.owner, request.repository
                )
            })?
            .json()
            .context("Unexpected pull request response")?;
        Ok(result)
    }
}
