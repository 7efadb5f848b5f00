//! `failwatch reconcile`: apply a report file to the tracking issues.

use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::payload::process_report;
use crate::ports::RepoRef;
use crate::reconcile::{format_actions, BuildContext};

/// Borrowed `reconcile` arguments.
pub struct ReconcileArgs<'a> {
    /// Repository owner.
    pub owner: &'a str,
    /// Repository name.
    pub repo: &'a str,
    /// CI build identifier.
    pub build_id: &'a str,
    /// Link to the build.
    pub build_url: &'a str,
    /// Report path, or `-` for stdin.
    pub report: &'a Path,
}

/// Reconcile the report named by `args` and print the actions taken.
///
/// # Errors
///
/// Returns an error if the report cannot be read or parsed, or a tracker call fails.
pub fn run_with_context(
    ctx: &ServiceContext,
    args: &ReconcileArgs<'_>,
    settings: &Settings,
) -> Result<(), String> {
    let text = match super::read_input(args.report) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %args.report.display(), "report file not found");
            None
        }
        Err(e) => return Err(format!("Failed to read report {}: {e}", args.report.display())),
    };

    let build = BuildContext {
        build_id: args.build_id.to_string(),
        build_url: args.build_url.to_string(),
        repo: RepoRef::new(args.owner, args.repo),
    };

    let outcome = super::block_on(process_report(ctx, text.as_deref(), &build, settings))?
        .map_err(|e| e.to_string())?;
    if let Some(report) = outcome {
        println!("{}", format_actions(&report.actions));
    }
    Ok(())
}
