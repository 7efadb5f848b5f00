//! Recording adapter for the `IssueTracker` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{
    Comment, Issue, IssueFuture, IssueState, IssueTracker, NewIssue, RepoRef, StateFilter,
};

const PORT: &str = "issues";

/// Records issue tracker interactions while delegating to an inner implementation.
pub struct RecordingIssueTracker {
    inner: Box<dyn IssueTracker>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingIssueTracker {
    /// Creates a new recording issue tracker wrapping the given implementation.
    pub fn new(inner: Box<dyn IssueTracker>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct ListIssuesInput<'a> {
    repo: &'a RepoRef,
    label: &'a str,
    state: StateFilter,
}

#[derive(Serialize)]
struct IssueInput<'a> {
    repo: &'a RepoRef,
    number: u64,
}

#[derive(Serialize)]
struct CreateIssueInput<'a> {
    repo: &'a RepoRef,
    issue: &'a NewIssue,
}

#[derive(Serialize)]
struct UpdateStateInput<'a> {
    repo: &'a RepoRef,
    number: u64,
    state: IssueState,
}

#[derive(Serialize)]
struct CreateCommentInput<'a> {
    repo: &'a RepoRef,
    number: u64,
    body: &'a str,
}

impl IssueTracker for RecordingIssueTracker {
    fn list_issues<'a>(
        &'a self,
        repo: &'a RepoRef,
        label: &'a str,
        state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>> {
        Box::pin(async move {
            let result = self.inner.list_issues(repo, label, state).await;
            let input = ListIssuesInput { repo, label, state };
            record_result(&self.recorder, PORT, "list_issues", &input, &result);
            result
        })
    }

    fn list_comments<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
    ) -> IssueFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            let result = self.inner.list_comments(repo, number).await;
            let input = IssueInput { repo, number };
            record_result(&self.recorder, PORT, "list_comments", &input, &result);
            result
        })
    }

    fn create_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: &'a NewIssue,
    ) -> IssueFuture<'a, Issue> {
        Box::pin(async move {
            let result = self.inner.create_issue(repo, issue).await;
            let input = CreateIssueInput { repo, issue };
            record_result(&self.recorder, PORT, "create_issue", &input, &result);
            result
        })
    }

    fn update_issue_state<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        state: IssueState,
    ) -> IssueFuture<'a, Issue> {
        Box::pin(async move {
            let result = self.inner.update_issue_state(repo, number, state).await;
            let input = UpdateStateInput { repo, number, state };
            record_result(&self.recorder, PORT, "update_issue_state", &input, &result);
            result
        })
    }

    fn create_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> IssueFuture<'a, Comment> {
        Box::pin(async move {
            let result = self.inner.create_comment(repo, number, body).await;
            let input = CreateCommentInput { repo, number, body };
            record_result(&self.recorder, PORT, "create_comment", &input, &result);
            result
        })
    }
}
