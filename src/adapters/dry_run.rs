//! Dry-run decorator for the `IssueTracker` port.
//!
//! Reads go to the wrapped tracker. Writes are logged and answered locally,
//! so a pass can be previewed against a real repository without changing it.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::ports::{
    Comment, Issue, IssueFuture, IssueState, IssueTracker, NewIssue, RepoRef, StateFilter,
};

/// Forwards reads and swallows writes.
pub struct DryRunIssueTracker {
    inner: Box<dyn IssueTracker>,
    next_id: AtomicU64,
}

impl DryRunIssueTracker {
    /// Wraps `inner`; no write reaches it.
    pub fn new(inner: Box<dyn IssueTracker>) -> Self {
        Self { inner, next_id: AtomicU64::new(1) }
    }

    /// Identifier for a would-be issue or comment. Counts down from
    /// `u64::MAX` so it never collides with a real number.
    fn placeholder_id(&self) -> u64 {
        u64::MAX - self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl IssueTracker for DryRunIssueTracker {
    fn list_issues<'a>(
        &'a self,
        repo: &'a RepoRef,
        label: &'a str,
        state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>> {
        self.inner.list_issues(repo, label, state)
    }

    fn list_comments<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
    ) -> IssueFuture<'a, Vec<Comment>> {
        self.inner.list_comments(repo, number)
    }

    fn create_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: &'a NewIssue,
    ) -> IssueFuture<'a, Issue> {
        let id = self.placeholder_id();
        info!(repo = %repo, title = %issue.title, "dry run: would create issue");
        let created = Issue {
            id,
            number: id,
            title: issue.title.clone(),
            body: issue.body.clone(),
            state: IssueState::Open,
        };
        Box::pin(async move { Ok(created) })
    }

    fn update_issue_state<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        state: IssueState,
    ) -> IssueFuture<'a, Issue> {
        info!(repo = %repo, number, state = state.as_str(), "dry run: would change issue state");
        let updated =
            Issue { id: number, number, title: String::new(), body: String::new(), state };
        Box::pin(async move { Ok(updated) })
    }

    fn create_comment<'a>(
        &'a self,
        repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> IssueFuture<'a, Comment> {
        info!(repo = %repo, number, "dry run: would comment on issue");
        let comment = Comment { id: self.placeholder_id(), body: body.to_string() };
        Box::pin(async move { Ok(comment) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory::{InMemoryIssueTracker, TrackerCall};
    use crate::reconcile::{BuildContext, Reconciler};
    use crate::report::Failure;

    #[tokio::test]
    async fn pass_reads_but_never_writes() {
        let inner = InMemoryIssueTracker::with_issues(
            "flaky",
            vec![Issue {
                id: 1,
                number: 1,
                title: "old: TestGone failed".into(),
                body: String::new(),
                state: IssueState::Open,
            }],
        );
        let inner = Arc::new(inner);
        let tracker = DryRunIssueTracker::new(Box::new(Arc::clone(&inner)));
        let build = BuildContext {
            build_id: "1".into(),
            build_url: "u".into(),
            repo: RepoRef::new("org", "repo"),
        };

        let report = Reconciler::new(&tracker, "flaky")
            .run(&[Failure::new("pkg/foo", "TestBar")], &build)
            .await
            .unwrap();

        assert_eq!(report.created(), 1);
        assert_eq!(report.closed(), 1);
        assert_eq!(inner.issues().len(), 1);
        assert_eq!(inner.issue(1).unwrap().state, IssueState::Open);
        assert!(inner.calls().iter().all(|call| matches!(
            call,
            TrackerCall::ListIssues { .. } | TrackerCall::ListComments { .. }
        )));
    }
}
