//! GitHub REST client implementing [`ReleaseHost`].

use super::retry::retry_with_backoff;
use crate::error::{HostingError, ReleaseError, Result};
use crate::github::{
    CheckRun, NewPullRequest, NewRelease, PullRequest, Release, ReleaseHost, ReleaseUpdate,
};
use crate::presence::Presence;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Releases fetched per page
const PAGE_SIZE: usize = 100;

/// Configuration for the GitHub client
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API base URL, e.g. `https://api.github.com`
    pub api_url: String,
    /// Token used for authentication
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries for idempotent reads
    pub max_retries: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

/// GitHub release-hosting client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    timeout: Duration,
    max_retries: u32,
}

#[derive(Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    name: String,
    #[serde(default)]
    sha: String,
}

#[derive(Deserialize)]
struct RawPull {
    number: u64,
    html_url: String,
    head: RawRef,
    base: RawRef,
}

impl From<RawPull> for PullRequest {
    fn from(raw: RawPull) -> Self {
        Self {
            number: raw.number,
            head: raw.head.name,
            base: raw.base.name,
            html_url: raw.html_url,
        }
    }
}

#[derive(Deserialize)]
struct CheckRunPage {
    #[serde(default)]
    total_count: Option<usize>,
    check_runs: Vec<CheckRun>,
}

impl CheckRunPage {
    /// Whether no page follows this one, given `fetched` runs before it
    fn is_last(&self, fetched: usize) -> bool {
        let seen = fetched + self.check_runs.len();
        self.check_runs.len() < PAGE_SIZE || self.total_count.is_some_and(|total| seen >= total)
    }
}

impl GitHubClient {
    /// Create a new client; fails when no token is configured
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let token = config.token.ok_or(HostingError::MissingToken)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("release_flow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HostingError::Request {
                operation: "client init".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            timeout: config.timeout,
            max_retries: config.max_retries,
        })
    }

    fn url(&self, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        log::debug!("GitHub API: {operation}");
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HostingError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| transport_error(operation, e))
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(operation, self.http.get(url).query(query)).await?;
        Self::decode(operation, response).await
    }

    /// GET with retries; reads are idempotent
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let deadline = self.timeout * (self.max_retries + 1) * 2;
        retry_with_backoff(
            || self.get_once(operation, url, query),
            self.max_retries,
            operation,
            deadline,
        )
        .await
    }

    /// GET that maps 404 to `None`
    async fn get_optional<T: DeserializeOwned>(&self, operation: &str, url: &str) -> Result<Option<T>> {
        match self.get_json(operation, url, &[]).await {
            Ok(value) => Ok(Some(value)),
            Err(ReleaseError::Hosting(HostingError::Status { status, .. }))
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> ReleaseError {
    if error.is_timeout() {
        HostingError::Timeout {
            operation: operation.to_string(),
        }
        .into()
    } else {
        HostingError::Request {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
        .into()
    }
}

fn owner_of(repo: &str) -> &str {
    repo.split_once('/').map(|(owner, _)| owner).unwrap_or(repo)
}

impl ReleaseHost for GitHubClient {
    async fn list_releases(&self, repo: &str) -> Result<Vec<Release>> {
        let url = self.url(repo, "releases");
        let mut releases = Vec::new();
        let mut page = 1usize;

        loop {
            let query = [("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())];
            let batch: Vec<Release> = self.get_json("list releases", &url, &query).await?;
            let done = batch.len() < PAGE_SIZE;
            releases.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        log::debug!("found {} release(s) in {repo}", releases.len());
        Ok(releases)
    }

    async fn create_release(&self, repo: &str, release: &NewRelease) -> Result<Release> {
        let operation = format!("create release {}", release.tag_name);
        let request = self.http.post(self.url(repo, "releases")).json(release);
        let response = self.send(&operation, request).await?;
        Self::decode(&operation, response).await
    }

    async fn update_release(&self, repo: &str, id: u64, update: &ReleaseUpdate) -> Result<Release> {
        let operation = format!("update release {id}");
        let request = self
            .http
            .patch(self.url(repo, &format!("releases/{id}")))
            .json(update);
        let response = self.send(&operation, request).await?;
        Self::decode(&operation, response).await
    }

    async fn release_url_by_tag(&self, repo: &str, tag: &str) -> Result<Option<String>> {
        let url = self.url(repo, &format!("releases/tags/{tag}"));
        let release: Option<Release> = self.get_optional("view release by tag", &url).await?;
        Ok(release.map(|r| r.html_url))
    }

    async fn list_pull_requests(&self, repo: &str, head: &str, base: &str) -> Result<Vec<PullRequest>> {
        let query = [
            ("state", "open".to_string()),
            ("head", format!("{}:{head}", owner_of(repo))),
            ("base", base.to_string()),
            ("per_page", PAGE_SIZE.to_string()),
        ];
        let pulls: Vec<RawPull> = self
            .get_json("list pull requests", &self.url(repo, "pulls"), &query)
            .await?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    async fn create_pull_request(&self, repo: &str, pull: &NewPullRequest) -> Result<PullRequest> {
        let operation = format!("create pull request {} -> {}", pull.head, pull.base);
        let request = self.http.post(self.url(repo, "pulls")).json(pull);
        let response = self.send(&operation, request).await?;
        let raw: RawPull = Self::decode(&operation, response).await?;
        Ok(raw.into())
    }

    async fn add_labels(&self, repo: &str, number: u64, labels: &[String]) -> Result<()> {
        let operation = format!("label pull request #{number}");
        let request = self
            .http
            .post(self.url(repo, &format!("issues/{number}/labels")))
            .json(&serde_json::json!({ "labels": labels }));
        self.send(&operation, request).await.map(|_| ())
    }

    async fn pull_request_checks(&self, repo: &str, number: u64) -> Result<Vec<CheckRun>> {
        #[derive(Deserialize)]
        struct PullHead {
            head: RawRef,
        }

        let pull: PullHead = self
            .get_json("view pull request", &self.url(repo, &format!("pulls/{number}")), &[])
            .await?;
        let url = self.url(repo, &format!("commits/{}/check-runs", pull.head.sha));
        let mut runs = Vec::new();
        let mut page = 1usize;

        loop {
            let query = [("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())];
            let batch: CheckRunPage = self.get_json("list check runs", &url, &query).await?;
            let done = batch.is_last(runs.len());
            runs.extend(batch.check_runs);
            if done {
                break;
            }
            page += 1;
        }

        log::debug!("found {} check run(s) for pull request #{number}", runs.len());
        Ok(runs)
    }

    async fn branch_exists(&self, repo: &str, branch: &str) -> Presence {
        let url = self.url(repo, &format!("git/ref/heads/{branch}"));
        match self.get_optional::<serde_json::Value>("view branch", &url).await {
            Ok(found) => Presence::from_bool(found.is_some()),
            Err(e) => Presence::QueryFailed(e.to_string()),
        }
    }
}
