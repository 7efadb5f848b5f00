//! Stable issue titles for failing tests.
//!
//! The title is both the visible issue title and the only key used to
//! match a failure to an existing issue, so it must not change between
//! runs for the same suite and case.

use crate::report::Failure;

/// Formats the title for a failure: `"<package>: <case> failed"`.
#[must_use]
pub fn failure_title(failure: &Failure) -> String {
    format!("{}: {} failed", short_package(&failure.suite), failure.case)
}

/// Strips a `<host>/<owner>/<repo>/` prefix from a module path.
///
/// `github.com/org/repo/pkg/foo` becomes `pkg/foo`. Anything without a
/// host-like first segment and at least one segment after the repo is
/// returned unchanged.
#[must_use]
pub fn short_package(suite: &str) -> &str {
    let mut parts = suite.splitn(4, '/');
    let (Some(host), Some(owner), Some(repo), Some(rest)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return suite;
    };
    if is_host(host) && !owner.is_empty() && !repo.is_empty() && !rest.is_empty() {
        rest
    } else {
        suite
    }
}

fn is_host(segment: &str) -> bool {
    segment.contains('.')
        && !segment.starts_with('.')
        && !segment.ends_with('.')
        && !segment.chars().any(char::is_whitespace)
}
