//! Two-phase reconciliation of failing tests against tracking issues.
//!
//! The open phase makes sure every failure has an open issue carrying a
//! record of this build. The close phase closes open issues whose test no
//! longer fails, unless this build already recorded a failure on them.

use std::collections::HashSet;
use std::fmt::Write as _;

use tracing::{info, warn};

use super::markers::{closing_comment, contains_build_failure, failure_body, failure_comment};
use super::title::failure_title;
use super::{BuildContext, ClosePolicy, ReconcileError};
use crate::ports::{Issue, IssueState, IssueTracker, NewIssue, StateFilter, TrackerError};
use crate::report::Failure;

/// One change (or deliberate non-change) made during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueAction {
    /// A new issue was opened for a failure.
    Created {
        /// Number of the new issue.
        number: u64,
        /// Its title.
        title: String,
    },
    /// A closed issue was reopened because its test failed again.
    Reopened {
        /// Issue number.
        number: u64,
        /// Issue title.
        title: String,
    },
    /// A failure record was appended to an existing issue.
    Commented {
        /// Issue number.
        number: u64,
        /// Issue title.
        title: String,
    },
    /// An issue was closed because its test passed.
    Closed {
        /// Issue number.
        number: u64,
        /// Issue title.
        title: String,
    },
    /// The close phase stopped at this issue.
    Halted {
        /// Issue number carrying the same-build failure record.
        number: u64,
        /// Issue title.
        title: String,
    },
    /// This issue was left open because it already records this build's failure.
    Skipped {
        /// Issue number.
        number: u64,
        /// Issue title.
        title: String,
    },
}

/// Everything a pass did, in the order it happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Actions in execution order.
    pub actions: Vec<IssueAction>,
}

impl ReconcileReport {
    /// Number of issues created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, IssueAction::Created { .. }))
    }

    /// Number of issues closed.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.count(|a| matches!(a, IssueAction::Closed { .. }))
    }

    /// Whether the close phase stopped early.
    #[must_use]
    pub fn halted(&self) -> bool {
        self.actions.iter().any(|a| matches!(a, IssueAction::Halted { .. }))
    }

    fn count(&self, pred: impl Fn(&IssueAction) -> bool) -> usize {
        self.actions.iter().filter(|a| pred(a)).count()
    }
}

/// Applies a test report's failures to the tracking issues of one repository.
pub struct Reconciler<'a> {
    tracker: &'a dyn IssueTracker,
    label: String,
    close_policy: ClosePolicy,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler that manages issues tagged with `label`.
    pub fn new(tracker: &'a dyn IssueTracker, label: impl Into<String>) -> Self {
        Self { tracker, label: label.into(), close_policy: ClosePolicy::default() }
    }

    /// Sets what the close phase does when it meets a same-build failure record.
    #[must_use]
    pub fn with_close_policy(mut self, close_policy: ClosePolicy) -> Self {
        self.close_policy = close_policy;
        self
    }

    /// The tracking label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fetches the labelled issues (open and closed) and reconciles against them.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Tracker`] if any tracker call fails.
    pub async fn run(
        &self,
        failures: &[Failure],
        build: &BuildContext,
    ) -> Result<ReconcileReport, ReconcileError> {
        let issues = self
            .tracker
            .list_issues(&build.repo, &self.label, StateFilter::All)
            .await
            .map_err(tracker_error("list issues", None))?;
        info!(issues = issues.len(), label = %self.label, "fetched tracking issues");
        self.reconcile(failures, &issues, build).await
    }

    /// Runs the open phase and then the close phase against an issue snapshot.
    ///
    /// Earlier mutations stay applied if a later call fails.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Tracker`] if any tracker call fails.
    pub async fn reconcile(
        &self,
        failures: &[Failure],
        issues: &[Issue],
        build: &BuildContext,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();
        self.open_failures(failures, issues, build, &mut report).await?;
        self.close_passing(failures, issues, build, &mut report).await?;
        Ok(report)
    }

    async fn open_failures(
        &self,
        failures: &[Failure],
        issues: &[Issue],
        build: &BuildContext,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        let repo = &build.repo;
        for failure in failures {
            let title = failure_title(failure);
            // First match wins; duplicate titles are left as they are.
            let Some(existing) = issues.iter().find(|issue| issue.title == title) else {
                let new_issue = NewIssue {
                    body: failure_body(&title, build),
                    title,
                    labels: vec![self.label.clone()],
                };
                let created = self
                    .tracker
                    .create_issue(repo, &new_issue)
                    .await
                    .map_err(tracker_error("create issue", None))?;
                info!(number = created.number, title = %new_issue.title, "opened issue");
                report
                    .actions
                    .push(IssueAction::Created { number: created.number, title: new_issue.title });
                continue;
            };

            if existing.state == IssueState::Closed {
                self.tracker
                    .update_issue_state(repo, existing.number, IssueState::Open)
                    .await
                    .map_err(tracker_error("reopen issue", Some(existing.number)))?;
                info!(number = existing.number, title = %title, "reopened issue");
                report
                    .actions
                    .push(IssueAction::Reopened { number: existing.number, title: title.clone() });
            }

            self.tracker
                .create_comment(repo, existing.number, &failure_comment(&title, build))
                .await
                .map_err(tracker_error("comment on issue", Some(existing.number)))?;
            info!(number = existing.number, title = %title, "recorded repeat failure");
            report.actions.push(IssueAction::Commented { number: existing.number, title });
        }
        Ok(())
    }

    async fn close_passing(
        &self,
        failures: &[Failure],
        issues: &[Issue],
        build: &BuildContext,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        let repo = &build.repo;
        let failing: HashSet<String> = failures.iter().map(failure_title).collect();

        for issue in issues.iter().filter(|issue| issue.state == IssueState::Open) {
            if failing.contains(&issue.title) {
                continue;
            }

            if self.records_build_failure(issue, build).await? {
                let number = issue.number;
                let title = issue.title.clone();
                match self.close_policy {
                    ClosePolicy::HaltPass => {
                        warn!(
                            number,
                            build_id = %build.build_id,
                            "issue already records this build's failure; closing no more issues"
                        );
                        report.actions.push(IssueAction::Halted { number, title });
                        break;
                    }
                    ClosePolicy::SkipIssue => {
                        info!(
                            number,
                            build_id = %build.build_id,
                            "issue already records a failure for this build; leaving it open"
                        );
                        report.actions.push(IssueAction::Skipped { number, title });
                        continue;
                    }
                }
            }

            self.tracker
                .create_comment(repo, issue.number, &closing_comment(build))
                .await
                .map_err(tracker_error("comment on issue", Some(issue.number)))?;
            self.tracker
                .update_issue_state(repo, issue.number, IssueState::Closed)
                .await
                .map_err(tracker_error("close issue", Some(issue.number)))?;
            info!(number = issue.number, title = %issue.title, "closed issue");
            report
                .actions
                .push(IssueAction::Closed { number: issue.number, title: issue.title.clone() });
        }
        Ok(())
    }

    /// Checks the body first, then the comments, for this build's failure record.
    async fn records_build_failure(
        &self,
        issue: &Issue,
        build: &BuildContext,
    ) -> Result<bool, ReconcileError> {
        if contains_build_failure(&issue.body, &build.build_id) {
            return Ok(true);
        }
        let comments = self
            .tracker
            .list_comments(&build.repo, issue.number)
            .await
            .map_err(tracker_error("list comments", Some(issue.number)))?;
        Ok(comments.iter().any(|comment| contains_build_failure(&comment.body, &build.build_id)))
    }
}

fn tracker_error(
    operation: &'static str,
    number: Option<u64>,
) -> impl FnOnce(TrackerError) -> ReconcileError {
    move |source| ReconcileError::Tracker { operation, number, source }
}

/// Formats actions as a human-readable report.
#[must_use]
pub fn format_actions(actions: &[IssueAction]) -> String {
    if actions.is_empty() {
        return "No issue changes.".to_string();
    }

    let mut out = String::new();
    for action in actions {
        let (verb, number, title) = match action {
            IssueAction::Created { number, title } => ("CREATE", number, title),
            IssueAction::Reopened { number, title } => ("REOPEN", number, title),
            IssueAction::Commented { number, title } => ("COMMENT", number, title),
            IssueAction::Closed { number, title } => ("CLOSE", number, title),
            IssueAction::Halted { number, title } => ("HALT", number, title),
            IssueAction::Skipped { number, title } => ("SKIP", number, title),
        };
        let _ = writeln!(out, "  {verb} #{number}: {title}");
    }
    out.truncate(out.trim_end().len());
    out
}
