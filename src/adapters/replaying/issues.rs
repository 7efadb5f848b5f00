//! Replaying adapter for the `IssueTracker` port.

use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{
    Comment, Issue, IssueFuture, IssueState, IssueTracker, NewIssue, RepoRef, StateFilter,
};

/// Serves recorded issue tracker results from a cassette.
///
/// Inputs are not checked against the recording; calls are answered in
/// recorded order per method.
pub struct ReplayingIssueTracker {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingIssueTracker {
    /// Create a replaying issue tracker backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn replay<T>(&self, method: &'static str) -> IssueFuture<'_, T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let output = next_output(&self.replayer, "issues", method);
        Box::pin(async move { extract_result(&output, &format!("issues::{method}")) })
    }
}

impl IssueTracker for ReplayingIssueTracker {
    fn list_issues<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _label: &'a str,
        _state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>> {
        self.replay("list_issues")
    }

    fn list_comments<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _number: u64,
    ) -> IssueFuture<'a, Vec<Comment>> {
        self.replay("list_comments")
    }

    fn create_issue<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _issue: &'a NewIssue,
    ) -> IssueFuture<'a, Issue> {
        self.replay("create_issue")
    }

    fn update_issue_state<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _number: u64,
        _state: IssueState,
    ) -> IssueFuture<'a, Issue> {
        self.replay("update_issue_state")
    }

    fn create_comment<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _number: u64,
        _body: &'a str,
    ) -> IssueFuture<'a, Comment> {
        self.replay("create_comment")
    }
}
