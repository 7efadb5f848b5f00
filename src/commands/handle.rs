//! `failwatch handle`: process one JSON invocation payload.

use std::path::Path;

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::payload::{handle_payload, InvocationPayload};
use crate::reconcile::format_actions;

/// Read a payload from `source` (stdin when absent or `-`) and handle it.
///
/// # Errors
///
/// Returns an error if the payload cannot be read or decoded, or the
/// reconciliation fails.
pub fn run_with_context(
    ctx: &ServiceContext,
    source: Option<&Path>,
    settings: &Settings,
) -> Result<(), String> {
    let source = source.unwrap_or(Path::new("-"));
    let text = super::read_input(source)
        .map_err(|e| format!("Failed to read payload {}: {e}", source.display()))?;
    let payload: InvocationPayload =
        serde_json::from_str(&text).map_err(|e| format!("Invalid payload: {e}"))?;

    let outcome = super::block_on(handle_payload(ctx, &payload, settings))?
        .map_err(|e| e.to_string())?;
    if let Some(report) = outcome {
        println!("{}", format_actions(&report.actions));
    }
    Ok(())
}
