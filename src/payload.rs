//! Invocation payload handling: one report from one CI job.

use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, Instrument};

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::ports::RepoRef;
use crate::reconcile::{BuildContext, ReconcileError, ReconcileReport, Reconciler};
use crate::report::parse_report;

/// Stand-in for a build ID or URL the caller did not supply.
pub const UNKNOWN: &str = "unknown";

/// What a CI job sends when it finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationPayload {
    /// Owner of the repository under test.
    pub repo_owner: String,
    /// Name of the repository under test.
    pub repo_name: String,
    /// CI build identifier.
    #[serde(rename = "buildID", default)]
    pub build_id: Option<String>,
    /// Link to the build.
    #[serde(rename = "buildURL", default)]
    pub build_url: Option<String>,
    /// Raw JUnit-style XML report.
    #[serde(default)]
    pub xunit_report_text: Option<String>,
}

impl InvocationPayload {
    /// Build context for this payload, with `unknown` standing in for a
    /// missing or empty build ID or URL.
    #[must_use]
    pub fn build_context(&self) -> BuildContext {
        let or_unknown = |value: &Option<String>| {
            value.as_deref().filter(|v| !v.is_empty()).unwrap_or(UNKNOWN).to_string()
        };
        BuildContext {
            build_id: or_unknown(&self.build_id),
            build_url: or_unknown(&self.build_url),
            repo: RepoRef::new(&self.repo_owner, &self.repo_name),
        }
    }
}

/// Reconciles the payload's report against the repository's tracking issues.
///
/// Returns `Ok(None)` when the payload carries no report.
///
/// # Errors
///
/// Returns an error if the report is malformed or a tracker call fails.
pub async fn handle_payload(
    ctx: &ServiceContext,
    payload: &InvocationPayload,
    settings: &Settings,
) -> Result<Option<ReconcileReport>, ReconcileError> {
    let build = payload.build_context();
    process_report(ctx, payload.xunit_report_text.as_deref(), &build, settings).await
}

/// Parses `report` and reconciles it for `build`, inside an `invocation` span.
///
/// A missing or blank report is a no-op.
///
/// # Errors
///
/// Returns an error if the report is malformed or a tracker call fails.
pub async fn process_report(
    ctx: &ServiceContext,
    report: Option<&str>,
    build: &BuildContext,
    settings: &Settings,
) -> Result<Option<ReconcileReport>, ReconcileError> {
    let span = info_span!(
        "invocation",
        invocation_id = %ctx.id_gen.generate_id(),
        owner = %build.repo.owner,
        repo = %build.repo.name,
        build_id = %build.build_id,
    );

    async move {
        let Some(text) = report.filter(|t| !t.trim().is_empty()) else {
            info!("no test report supplied; nothing to reconcile");
            return Ok(None);
        };

        let failures =
            parse_report(text).inspect_err(|e| error!(error = %e, "malformed test report"))?;
        info!(failures = failures.len(), "parsed test report");

        let report = Reconciler::new(ctx.issues.as_ref(), settings.label.as_str())
            .with_close_policy(settings.close_policy)
            .run(&failures, build)
            .await
            .inspect_err(|e| error!(error = %e, "reconciliation aborted"))?;

        info!(
            actions = report.actions.len(),
            created = report.created(),
            closed = report.closed(),
            halted = report.halted(),
            "reconciliation finished"
        );
        Ok(Some(report))
    }
    .instrument(span)
    .await
}
