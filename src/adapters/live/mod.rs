//! Live adapters for real external interactions.

pub mod github;
pub mod id_gen;

pub use github::{GitHubConfig, GitHubIssueTracker};
pub use id_gen::UuidGenerator;
