//! Issue tracker port for tracking-issue storage.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Error type returned by every [`IssueTracker`] call.
pub type TrackerError = Box<dyn Error + Send + Sync>;

/// Boxed future type alias used by [`IssueTracker`] to keep the trait dyn-compatible.
pub type IssueFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TrackerError>> + Send + 'a>>;

/// Repository that owns a set of tracking issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Creates a repository reference.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Open/closed state of a tracked issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    /// The issue is open.
    Open,
    /// The issue is closed.
    Closed,
}

impl IssueState {
    /// The lowercase wire name (`"open"` / `"closed"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// State filter for [`IssueTracker::list_issues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    /// Only open issues.
    Open,
    /// Only closed issues.
    Closed,
    /// Issues in either state.
    All,
}

impl StateFilter {
    /// The lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }

    /// Whether an issue in `state` passes this filter.
    #[must_use]
    pub fn matches(self, state: IssueState) -> bool {
        match self {
            Self::All => true,
            Self::Open => state == IssueState::Open,
            Self::Closed => state == IssueState::Closed,
        }
    }
}

/// A tracked issue as seen by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Store-wide identifier.
    pub id: u64,
    /// Per-repository number; all mutations address issues by number.
    pub number: u64,
    /// The issue title. Doubles as the failure matching key.
    pub title: String,
    /// The issue body. May be empty.
    #[serde(default)]
    pub body: String,
    /// Current state.
    pub state: IssueState,
}

/// A comment attached to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Store-wide identifier.
    pub id: u64,
    /// Comment text.
    #[serde(default)]
    pub body: String,
}

/// Fields for a new issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    /// Title of the new issue.
    pub title: String,
    /// Body of the new issue.
    pub body: String,
    /// Labels to apply at creation.
    pub labels: Vec<String>,
}

/// Manages tracking issues in an external store.
///
/// Every call is a suspension point. The reconciler awaits them one at a
/// time, so implementations need not guard against overlapping calls
/// from a single pass.
pub trait IssueTracker: Send + Sync {
    /// Lists issues carrying `label` in the given state.
    ///
    /// # Errors
    ///
    /// Returns an error if the issues cannot be listed.
    fn list_issues<'a>(
        &'a self,
        repo: &'a RepoRef,
        label: &'a str,
        state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>>;

    /// Lists all comments on an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be found or its comments listed.
    fn list_comments<'a>(&'a self, repo: &'a RepoRef, number: u64)
        -> IssueFuture<'a, Vec<Comment>>;

    /// Creates a new issue and returns it with its assigned identifiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be created.
    fn create_issue<'a>(&'a self, repo: &'a RepoRef, issue: &'a NewIssue) -> IssueFuture<'a, Issue>;

    /// Moves an issue to `state` and returns the updated issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be found or updated.
    fn update_issue_state<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        state: IssueState,
    ) -> IssueFuture<'a, Issue>;

    /// Appends a comment to an issue.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment cannot be created.
    fn create_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> IssueFuture<'a, Comment>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for Arc<T> {
    fn list_issues<'a>(
        &'a self,
        repo: &'a RepoRef,
        label: &'a str,
        state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>> {
        (**self).list_issues(repo, label, state)
    }

    fn list_comments<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
    ) -> IssueFuture<'a, Vec<Comment>> {
        (**self).list_comments(repo, number)
    }

    fn create_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: &'a NewIssue,
    ) -> IssueFuture<'a, Issue> {
        (**self).create_issue(repo, issue)
    }

    fn update_issue_state<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        state: IssueState,
    ) -> IssueFuture<'a, Issue> {
        (**self).update_issue_state(repo, number, state)
    }

    fn create_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> IssueFuture<'a, Comment> {
        (**self).create_comment(repo, number, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_filter_matches() {
        assert!(StateFilter::All.matches(IssueState::Closed));
        assert!(StateFilter::Open.matches(IssueState::Open));
        assert!(!StateFilter::Open.matches(IssueState::Closed));
        assert!(!StateFilter::Closed.matches(IssueState::Open));
    }

    #[test]
    fn issue_state_serializes_lowercase() {
        let json = serde_json::to_string(&IssueState::Closed).unwrap();
        assert_eq!(json, "\"closed\"");
    }

    #[test]
    fn issue_tolerates_missing_body() {
        let issue: Issue =
            serde_json::from_str(r#"{"id": 1, "number": 7, "title": "t", "state": "open"}"#)
                .unwrap();
        assert_eq!(issue.body, "");
        assert_eq!(issue.number, 7);
    }

    #[test]
    fn repo_ref_displays_as_slug() {
        assert_eq!(RepoRef::new("org", "repo").to_string(), "org/repo");
    }
}
