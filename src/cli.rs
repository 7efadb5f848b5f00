//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::adapters::live::github::DEFAULT_API_BASE;
use crate::config::{Settings, DEFAULT_LABEL, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_MS};
use crate::reconcile::ClosePolicy;

/// Top-level CLI parser for `failwatch`.
#[derive(Debug, Parser)]
#[command(name = "failwatch", version, about = "Keep tracking issues in step with failing tests")]
pub struct Cli {
    /// Settings shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted before or after any subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Label that marks tracking issues.
    #[arg(long, global = true, env = "FAILWATCH_LABEL", default_value = DEFAULT_LABEL)]
    pub label: String,

    /// What to do when an open issue already records this build's failure.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "FAILWATCH_CLOSE_POLICY",
        default_value_t = ClosePolicy::HaltPass
    )]
    pub close_policy: ClosePolicy,

    /// GitHub API root.
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    pub github_api_url: String,

    /// GitHub token used as a bearer credential.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, env = "FAILWATCH_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// How many of the most recent labelled issues to consider.
    #[arg(
        long,
        global = true,
        env = "FAILWATCH_PAGE_SIZE",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub page_size: u8,
}

impl GlobalArgs {
    /// Resolve these flags into runtime settings.
    #[must_use]
    pub fn settings(&self, dry_run: bool) -> Settings {
        Settings {
            label: self.label.clone(),
            github_api_base: self.github_api_url.clone(),
            github_token: self.github_token.clone(),
            request_timeout_ms: self.timeout_ms,
            issue_page_size: self.page_size,
            close_policy: self.close_policy,
            dry_run,
        }
    }
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile a test report file against the tracking issues.
    Reconcile {
        /// Repository owner.
        #[arg(long)]
        owner: String,
        /// Repository name.
        #[arg(long)]
        repo: String,
        /// CI build identifier.
        #[arg(long)]
        build_id: String,
        /// Link to the build.
        #[arg(long)]
        build_url: String,
        /// JUnit XML report path, or `-` for stdin.
        #[arg(long)]
        report: PathBuf,
        /// Log issue changes without making them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Handle a JSON invocation payload.
    Handle {
        /// Payload file, or `-` for stdin (the default).
        payload: Option<PathBuf>,
        /// Log issue changes without making them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the tracking title of every failure in a report.
    Parse {
        /// JUnit XML report path.
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::reconcile::ClosePolicy;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parses_reconcile_subcommand() {
        let cli = Cli::parse_from([
            "failwatch",
            "reconcile",
            "--owner",
            "org",
            "--repo",
            "repo",
            "--build-id",
            "42",
            "--build-url",
            "https://ci.example.com/42",
            "--report",
            "-",
            "--dry-run",
        ]);
        match cli.command {
            Command::Reconcile { owner, build_id, report, dry_run, .. } => {
                assert_eq!(owner, "org");
                assert_eq!(build_id, "42");
                assert_eq!(report, PathBuf::from("-"));
                assert!(dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "failwatch",
            "parse",
            "report.xml",
            "--label",
            "ci-flake",
            "--close-policy",
            "skip-issue",
            "--page-size",
            "25",
        ]);
        let settings = cli.global.settings(false);
        assert_eq!(settings.label, "ci-flake");
        assert_eq!(settings.close_policy, ClosePolicy::SkipIssue);
        assert_eq!(settings.issue_page_size, 25);
        assert!(matches!(cli.command, Command::Parse { .. }));
    }

    #[test]
    fn handle_payload_is_optional() {
        let cli = Cli::parse_from(["failwatch", "handle"]);
        assert!(matches!(cli.command, Command::Handle { payload: None, dry_run: false }));
    }

    #[test]
    fn rejects_page_size_out_of_range() {
        for size in ["0", "101"] {
            let result = Cli::try_parse_from(["failwatch", "--page-size", size, "parse", "r.xml"]);
            assert!(result.is_err(), "page size {size} accepted");
        }
    }

    #[test]
    fn reconcile_requires_build_id() {
        let result = Cli::try_parse_from([
            "failwatch",
            "reconcile",
            "--owner",
            "org",
            "--repo",
            "repo",
            "--build-url",
            "u",
            "--report",
            "r.xml",
        ]);
        assert!(result.is_err());
    }
}
