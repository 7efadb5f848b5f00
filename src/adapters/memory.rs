//! In-process adapter for the `IssueTracker` port.
//!
//! Holds a single repository's issues in memory and keeps a log of every
//! call, so tests can assert on exactly what the reconciler asked for.
//! Listing mirrors the GitHub adapter: newest first, one page of at most
//! `page_size` issues.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::ports::{
    Comment, Issue, IssueFuture, IssueState, IssueTracker, NewIssue, RepoRef, StateFilter,
};

/// A call received by [`InMemoryIssueTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    /// `list_issues`
    ListIssues {
        /// Requested label.
        label: String,
        /// Requested state filter.
        state: StateFilter,
    },
    /// `list_comments`
    ListComments {
        /// Issue number.
        number: u64,
    },
    /// `create_issue`
    CreateIssue {
        /// Title of the new issue.
        title: String,
    },
    /// `update_issue_state`
    UpdateIssueState {
        /// Issue number.
        number: u64,
        /// Target state.
        state: IssueState,
    },
    /// `create_comment`
    CreateComment {
        /// Issue number.
        number: u64,
        /// Comment text.
        body: String,
    },
}

#[derive(Debug, Default)]
struct Store {
    /// Oldest first.
    issues: Vec<(Issue, Vec<String>)>,
    page_size: Option<usize>,
    comments: HashMap<u64, Vec<Comment>>,
    calls: Vec<TrackerCall>,
    call_counts: HashMap<&'static str, usize>,
    fail_at: HashMap<&'static str, usize>,
    next_comment_id: u64,
}

impl Store {
    /// Counts the call and reports whether it is the one set to fail.
    fn tick(&mut self, method: &'static str) -> Result<(), crate::ports::TrackerError> {
        let count = self.call_counts.entry(method).or_insert(0);
        *count += 1;
        if self.fail_at.get(method) == Some(count) {
            return Err(format!("{method}: injected failure").into());
        }
        Ok(())
    }

    fn find_mut(&mut self, number: u64) -> Result<&mut Issue, crate::ports::TrackerError> {
        self.issues
            .iter_mut()
            .map(|(issue, _)| issue)
            .find(|issue| issue.number == number)
            .ok_or_else(|| format!("issue #{number} not found").into())
    }

    fn next_number(&self) -> u64 {
        self.issues.iter().map(|(issue, _)| issue.number).max().unwrap_or(0) + 1
    }
}

/// Issue tracker backed by process memory. The `repo` argument is ignored.
#[derive(Debug, Default)]
pub struct InMemoryIssueTracker {
    store: Mutex<Store>,
}

impl InMemoryIssueTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker holding `issues`, all tagged with `label`.
    ///
    /// `issues` is given newest first, the order `list_issues` returns them in.
    #[must_use]
    pub fn with_issues(label: &str, issues: Vec<Issue>) -> Self {
        let tracker = Self::new();
        for issue in issues.into_iter().rev() {
            tracker.seed_labelled(issue, &[label]);
        }
        tracker
    }

    /// Caps how many issues one `list_issues` call returns.
    #[must_use]
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.lock().page_size = Some(page_size);
        self
    }

    /// Adds an issue with the given labels as the newest one.
    pub fn seed_labelled(&self, issue: Issue, labels: &[&str]) {
        let labels = labels.iter().map(|l| (*l).to_string()).collect();
        self.lock().issues.push((issue, labels));
    }

    /// Adds an existing comment to an issue.
    pub fn seed_comment(&self, number: u64, comment: Comment) {
        let mut store = self.lock();
        store.next_comment_id = store.next_comment_id.max(comment.id);
        store.comments.entry(number).or_default().push(comment);
    }

    /// Makes the `nth` call (1-based) to `method` fail.
    pub fn fail_on(&self, method: &'static str, nth: usize) {
        self.lock().fail_at.insert(method, nth);
    }

    /// Snapshot of all issues, oldest first.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        self.lock().issues.iter().map(|(issue, _)| issue.clone()).collect()
    }

    /// Snapshot of one issue.
    #[must_use]
    pub fn issue(&self, number: u64) -> Option<Issue> {
        self.lock().issues.iter().map(|(issue, _)| issue).find(|i| i.number == number).cloned()
    }

    /// Labels attached to an issue.
    #[must_use]
    pub fn labels_of(&self, number: u64) -> Vec<String> {
        self.lock()
            .issues
            .iter()
            .find(|(issue, _)| issue.number == number)
            .map(|(_, labels)| labels.clone())
            .unwrap_or_default()
    }

    /// Comments on an issue, oldest first.
    #[must_use]
    pub fn comments_of(&self, number: u64) -> Vec<Comment> {
        self.lock().comments.get(&number).cloned().unwrap_or_default()
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TrackerCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("in-memory tracker lock poisoned")
    }
}

impl IssueTracker for InMemoryIssueTracker {
    fn list_issues<'a>(
        &'a self,
        _repo: &'a RepoRef,
        label: &'a str,
        state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>> {
        let result = {
            let mut store = self.lock();
            store.calls.push(TrackerCall::ListIssues { label: label.to_string(), state });
            let page_size = store.page_size.unwrap_or(usize::from(DEFAULT_PAGE_SIZE));
            store.tick("list_issues").map(|()| {
                store
                    .issues
                    .iter()
                    .rev()
                    .filter(|(issue, labels)| {
                        state.matches(issue.state) && labels.iter().any(|l| l == label)
                    })
                    .take(page_size)
                    .map(|(issue, _)| issue.clone())
                    .collect()
            })
        };
        Box::pin(async move { result })
    }

    fn list_comments<'a>(
        &'a self,
        _repo: &'a RepoRef,
        number: u64,
    ) -> IssueFuture<'a, Vec<Comment>> {
        let result = {
            let mut store = self.lock();
            store.calls.push(TrackerCall::ListComments { number });
            store
                .tick("list_comments")
                .and_then(|()| store.find_mut(number).map(|_| ()))
                .map(|()| store.comments.get(&number).cloned().unwrap_or_default())
        };
        Box::pin(async move { result })
    }

    fn create_issue<'a>(
        &'a self,
        _repo: &'a RepoRef,
        issue: &'a NewIssue,
    ) -> IssueFuture<'a, Issue> {
        let result = {
            let mut store = self.lock();
            store.calls.push(TrackerCall::CreateIssue { title: issue.title.clone() });
            store.tick("create_issue").map(|()| {
                let number = store.next_number();
                let created = Issue {
                    id: number,
                    number,
                    title: issue.title.clone(),
                    body: issue.body.clone(),
                    state: IssueState::Open,
                };
                store.issues.push((created.clone(), issue.labels.clone()));
                created
            })
        };
        Box::pin(async move { result })
    }

    fn update_issue_state<'a>(
        &'a self,
        _repo: &'a RepoRef,
        number: u64,
        state: IssueState,
    ) -> IssueFuture<'a, Issue> {
        let result = {
            let mut store = self.lock();
            store.calls.push(TrackerCall::UpdateIssueState { number, state });
            store.tick("update_issue_state").and_then(|()| {
                let issue = store.find_mut(number)?;
                issue.state = state;
                Ok(issue.clone())
            })
        };
        Box::pin(async move { result })
    }

    fn create_comment<'a>(
        &'a self,
        _repo: &'a RepoRef,
        number: u64,
        body: &'a str,
    ) -> IssueFuture<'a, Comment> {
        let result = {
            let mut store = self.lock();
            store.calls.push(TrackerCall::CreateComment { number, body: body.to_string() });
            store.tick("create_comment").and_then(|()| {
                store.find_mut(number)?;
                store.next_comment_id += 1;
                let comment = Comment { id: store.next_comment_id, body: body.to_string() };
                store.comments.entry(number).or_default().push(comment.clone());
                Ok(comment)
            })
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoRef {
        RepoRef::new("org", "repo")
    }

    #[tokio::test]
    async fn created_issues_are_numbered_and_listed() {
        let tracker = InMemoryIssueTracker::new();
        let new_issue =
            NewIssue { title: "t".into(), body: "b".into(), labels: vec!["flaky".into()] };

        let first = tracker.create_issue(&repo(), &new_issue).await.unwrap();
        let second = tracker.create_issue(&repo(), &new_issue).await.unwrap();

        assert_eq!((first.number, second.number), (1, 2));
        let listed = tracker.list_issues(&repo(), "flaky", StateFilter::Open).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(tracker.list_issues(&repo(), "other", StateFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_newest_first_within_one_page() {
        let tracker = InMemoryIssueTracker::new().with_page_size(2);
        let new_issue =
            NewIssue { title: "t".into(), body: String::new(), labels: vec!["flaky".into()] };
        for _ in 0..3 {
            tracker.create_issue(&repo(), &new_issue).await.unwrap();
        }

        let listed = tracker.list_issues(&repo(), "flaky", StateFilter::All).await.unwrap();

        let numbers: Vec<u64> = listed.iter().map(|issue| issue.number).collect();
        assert_eq!(numbers, vec![3, 2]);
    }

    #[tokio::test]
    async fn seeded_issues_list_in_given_order() {
        let issue = |number| Issue {
            id: number,
            number,
            title: format!("t{number}"),
            body: String::new(),
            state: IssueState::Open,
        };
        let tracker = InMemoryIssueTracker::with_issues("flaky", vec![issue(7), issue(4)]);

        let listed = tracker.list_issues(&repo(), "flaky", StateFilter::Open).await.unwrap();

        assert_eq!(listed[0].number, 7);
        assert_eq!(listed[1].number, 4);
    }

    #[tokio::test]
    async fn unknown_issue_is_an_error() {
        let tracker = InMemoryIssueTracker::new();
        let err = tracker.create_comment(&repo(), 99, "hi").await.unwrap_err();
        assert!(err.to_string().contains("#99 not found"));
    }

    #[tokio::test]
    async fn injected_failure_hits_only_the_nth_call() {
        let tracker = InMemoryIssueTracker::new();
        tracker.fail_on("list_issues", 2);

        assert!(tracker.list_issues(&repo(), "x", StateFilter::All).await.is_ok());
        assert!(tracker.list_issues(&repo(), "x", StateFilter::All).await.is_err());
        assert!(tracker.list_issues(&repo(), "x", StateFilter::All).await.is_ok());
        assert_eq!(tracker.calls().len(), 3);
    }
}
