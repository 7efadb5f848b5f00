//! Live adapter for the `IssueTracker` port using the GitHub REST API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ports::{
    Comment, Issue, IssueFuture, IssueState, IssueTracker, NewIssue, RepoRef, StateFilter,
    TrackerError,
};

/// Base URL of the public GitHub API.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const COMMENTS_PER_PAGE: usize = 100;
const MAX_ERROR_BODY: usize = 300;

/// Connection settings for [`GitHubIssueTracker`].
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API root, without a trailing slash.
    pub api_base: String,
    /// Token sent as a bearer credential, if any.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How many of the most recent issues `list_issues` returns.
    pub issue_page_size: u8,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
            issue_page_size: 100,
        }
    }
}

/// Issue tracker that talks to GitHub issues.
pub struct GitHubIssueTracker {
    client: Client,
    api_base: String,
    issue_page_size: u8,
}

impl GitHubIssueTracker {
    /// Builds a tracker with default headers and timeout applied to every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &GitHubConfig) -> Result<Self, TrackerError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("failwatch"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = config.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| format!("invalid GitHub token: {e}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("failed to build GitHub client: {e}"))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            issue_page_size: config.issue_page_size.clamp(1, 100),
        })
    }

    fn issues_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}/issues", self.api_base, repo.owner, repo.name)
    }

    fn issue_url(&self, repo: &RepoRef, number: u64) -> String {
        format!("{}/{number}", self.issues_url(repo))
    }
}

/// Issue as returned by the REST API. Pull requests share the endpoint.
#[derive(Deserialize)]
struct ApiIssue {
    id: u64,
    number: u64,
    title: String,
    body: Option<String>,
    state: IssueState,
    pull_request: Option<serde_json::Value>,
}

impl From<ApiIssue> for Issue {
    fn from(api: ApiIssue) -> Self {
        Self {
            id: api.id,
            number: api.number,
            title: api.title,
            body: api.body.unwrap_or_default(),
            state: api.state,
        }
    }
}

#[derive(Deserialize)]
struct ApiComment {
    id: u64,
    body: Option<String>,
}

impl From<ApiComment> for Comment {
    fn from(api: ApiComment) -> Self {
        Self { id: api.id, body: api.body.unwrap_or_default() }
    }
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Serialize)]
struct StatePatch {
    state: IssueState,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// Sends a request and decodes a JSON response, mapping non-2xx statuses to errors.
async fn send_json<T: DeserializeOwned>(
    operation: &str,
    request: RequestBuilder,
) -> Result<T, TrackerError> {
    let response = request
        .send()
        .await
        .map_err(|e| format!("GitHub {operation} request failed: {e}"))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| format!("failed to read GitHub {operation} response: {e}"))?;

    if !status.is_success() {
        return Err(api_error(operation, status.as_u16(), &text));
    }

    serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse GitHub {operation} response: {e}").into())
}

/// Builds the error for a failed API call, preferring the API's own message.
fn api_error(operation: &str, status: u16, body: &str) -> TrackerError {
    let msg = serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| truncate(body, MAX_ERROR_BODY));
    format!("GitHub {operation} failed ({status}): {msg}").into()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl IssueTracker for GitHubIssueTracker {
    fn list_issues<'a>(
        &'a self,
        repo: &'a RepoRef,
        label: &'a str,
        state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>> {
        Box::pin(async move {
            let per_page = self.issue_page_size.to_string();
            let request = self.client.get(self.issues_url(repo)).query(&[
                ("labels", label),
                ("state", state.as_str()),
                ("sort", "created"),
                ("direction", "desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
            ]);
            let rows: Vec<ApiIssue> = send_json("list issues", request).await?;
            debug!(repo = %repo, rows = rows.len(), "listed issues");
            Ok(rows.into_iter().filter(|row| row.pull_request.is_none()).map(Issue::from).collect())
        })
    }

    fn list_comments<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
    ) -> IssueFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            let url = format!("{}/comments", self.issue_url(repo, number));
            let per_page = COMMENTS_PER_PAGE.to_string();
            let mut page = 1_u32;
            let mut comments = Vec::new();
            loop {
                let page_value = page.to_string();
                let request = self
                    .client
                    .get(&url)
                    .query(&[("per_page", per_page.as_str()), ("page", page_value.as_str())]);
                let chunk: Vec<ApiComment> = send_json("list comments", request).await?;
                let chunk_len = chunk.len();
                comments.extend(chunk.into_iter().map(Comment::from));
                if chunk_len < COMMENTS_PER_PAGE {
                    break;
                }
                page = page.saturating_add(1);
            }
            Ok(comments)
        })
    }

    fn create_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: &'a NewIssue,
    ) -> IssueFuture<'a, Issue> {
        Box::pin(async move {
            let request = self.client.post(self.issues_url(repo)).json(issue);
            let created: ApiIssue = send_json("create issue", request).await?;
            Ok(created.into())
        })
    }

    fn update_issue_state<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        state: IssueState,
    ) -> IssueFuture<'a, Issue> {
        Box::pin(async move {
            let request =
                self.client.patch(self.issue_url(repo, number)).json(&StatePatch { state });
            let updated: ApiIssue = send_json("update issue", request).await?;
            Ok(updated.into())
        })
    }

    fn create_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> IssueFuture<'a, Comment> {
        Box::pin(async move {
            let url = format!("{}/comments", self.issue_url(repo, number));
            let request = self.client.post(url).json(&CommentBody { body });
            let created: ApiComment = send_json("create comment", request).await?;
            Ok(created.into())
        })
    }
}
