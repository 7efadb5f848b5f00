//! Failure identity, issue markers and the reconciliation engine.

pub mod engine;
pub mod markers;
pub mod title;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{RepoRef, TrackerError};
use crate::report::ReportError;

pub use engine::{format_actions, IssueAction, ReconcileReport, Reconciler};
pub use title::failure_title;

/// The build a report belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    /// CI build identifier. Shared by every job of the build.
    pub build_id: String,
    /// Link to the build, quoted in issue text.
    pub build_url: String,
    /// Repository whose issues are reconciled.
    pub repo: RepoRef,
}

/// What the close phase does on finding an open issue that already records
/// a failure for the current build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ClosePolicy {
    /// Stop closing issues for the rest of the pass.
    #[default]
    HaltPass,
    /// Leave that issue open and keep evaluating the others.
    SkipIssue,
}

/// Errors that abort a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The test report could not be parsed.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// An issue tracker call failed.
    #[error("failed to {operation}{}: {source}", .number.map(issue_suffix).unwrap_or_default())]
    Tracker {
        /// What the reconciler was doing.
        operation: &'static str,
        /// Issue number, when the call targeted one issue.
        number: Option<u64>,
        /// Error reported by the tracker.
        #[source]
        source: TrackerError,
    },
}

fn issue_suffix(number: u64) -> String {
    format!(" #{number}")
}
