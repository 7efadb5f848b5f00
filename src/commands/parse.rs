//! `failwatch parse`: list the tracking titles in a report.

use std::path::Path;

use crate::reconcile::failure_title;
use crate::report::{parse_report, Failure};

/// Print one tracking title per failing test case in the report at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid report.
pub fn run(path: &Path) -> Result<(), String> {
    let text = super::read_input(path)
        .map_err(|e| format!("Failed to read report {}: {e}", path.display()))?;
    let failures =
        parse_report(&text).map_err(|e| format!("Invalid report {}: {e}", path.display()))?;
    let titles = render_titles(&failures);
    if !titles.is_empty() {
        println!("{titles}");
    }
    Ok(())
}

fn render_titles(failures: &[Failure]) -> String {
    failures.iter().map(failure_title).collect::<Vec<_>>().join("\n")
}
