//! Runtime settings shared by every command.

use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::live::GitHubConfig;
use crate::adapters::live::github::DEFAULT_API_BASE;
use crate::reconcile::ClosePolicy;

/// Label that marks tracking issues when none is configured.
pub const DEFAULT_LABEL: &str = "test-failure";
/// Per-request timeout when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Number of most recent issues fetched per pass.
pub const DEFAULT_PAGE_SIZE: u8 = 100;
/// Environment variable naming a directory to record cassettes into.
pub const RECORD_ENV: &str = "FAILWATCH_RECORD";

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Label used to find and tag tracking issues.
    pub label: String,
    /// GitHub API root.
    pub github_api_base: String,
    /// Token for the GitHub API, if any.
    pub github_token: Option<String>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// How many of the most recent labelled issues a pass considers.
    pub issue_page_size: u8,
    /// Close-phase behavior on a same-build failure marker.
    pub close_policy: ClosePolicy,
    /// Log writes instead of performing them.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            github_api_base: DEFAULT_API_BASE.to_string(),
            github_token: None,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            issue_page_size: DEFAULT_PAGE_SIZE,
            close_policy: ClosePolicy::default(),
            dry_run: false,
        }
    }
}

impl Settings {
    /// Connection settings for the GitHub adapter.
    #[must_use]
    pub fn github(&self) -> GitHubConfig {
        GitHubConfig {
            api_base: self.github_api_base.clone(),
            token: self.github_token.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
            issue_page_size: self.issue_page_size,
        }
    }
}

/// Directory to record cassettes into, from `FAILWATCH_RECORD`.
#[must_use]
pub fn record_dir() -> Option<PathBuf> {
    std::env::var_os(RECORD_ENV).filter(|v| !v.is_empty()).map(PathBuf::from)
}
