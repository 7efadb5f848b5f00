//! Port traits defining external boundaries.
//!
//! Each trait is a boundary between the reconciliation core and something
//! outside the process. Implementations live in `src/adapters/`.

pub mod id_gen;
pub mod issues;

pub use id_gen::IdGenerator;
pub use issues::{
    Comment, Issue, IssueFuture, IssueState, IssueTracker, NewIssue, RepoRef, StateFilter,
    TrackerError,
};
