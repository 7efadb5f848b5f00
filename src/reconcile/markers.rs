//! Free-text failure markers embedded in issue bodies and comments.
//!
//! A body or comment records a failure for a build when it contains both
//! `buildID: <id>` and `status: failed`. These strings are persisted in the
//! tracker, so their format must stay exactly as written here.

use super::BuildContext;

const STATUS_FAILED: &str = "status: failed";

/// Renders the body of a newly opened tracking issue.
#[must_use]
pub fn failure_body(title: &str, build: &BuildContext) -> String {
    failure_record(title, build)
}

/// Renders the comment appended to an existing issue for a repeat failure.
#[must_use]
pub fn failure_comment(title: &str, build: &BuildContext) -> String {
    failure_record(title, build)
}

/// Renders the comment posted just before an issue is closed.
#[must_use]
pub fn closing_comment(build: &BuildContext) -> String {
    format!("Test passed in build {} ({})! Closing this issue.", build.build_id, build.build_url)
}

/// Whether `text` records a failure for `build_id`.
#[must_use]
pub fn contains_build_failure(text: &str, build_id: &str) -> bool {
    text.contains(&build_marker(build_id)) && text.contains(STATUS_FAILED)
}

fn build_marker(build_id: &str) -> String {
    format!("buildID: {build_id}")
}

fn failure_record(title: &str, build: &BuildContext) -> String {
    format!(
        "{title}\n\n{}\nbuildURL: {}\n{STATUS_FAILED}\n",
        build_marker(&build.build_id),
        build.build_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RepoRef;

    fn build(id: &str) -> BuildContext {
        BuildContext {
            build_id: id.to_string(),
            build_url: format!("https://ci.example.com/builds/{id}"),
            repo: RepoRef::new("org", "repo"),
        }
    }

    #[test]
    fn failure_body_carries_markers() {
        let body = failure_body("pkg/foo: TestBar failed", &build("123"));
        assert!(body.starts_with("pkg/foo: TestBar failed\n"));
        assert!(body.contains("buildID: 123"));
        assert!(body.contains("buildURL: https://ci.example.com/builds/123"));
        assert!(body.contains("status: failed"));
    }

    #[test]
    fn rendered_records_match_their_own_build() {
        let b = build("77");
        assert!(contains_build_failure(&failure_body("t", &b), "77"));
        assert!(contains_build_failure(&failure_comment("t", &b), "77"));
        assert!(!contains_build_failure(&failure_comment("t", &b), "78"));
    }

    #[test]
    fn closing_comment_text() {
        assert_eq!(
            closing_comment(&build("9")),
            "Test passed in build 9 (https://ci.example.com/builds/9)! Closing this issue."
        );
    }

    #[test]
    fn closing_comment_is_not_a_failure_record() {
        assert!(!contains_build_failure(&closing_comment(&build("9")), "9"));
    }

    #[test]
    fn both_markers_required() {
        assert!(!contains_build_failure("buildID: 5", "5"));
        assert!(!contains_build_failure("status: failed", "5"));
        assert!(contains_build_failure("status: failed ... later buildID: 5", "5"));
    }

    #[test]
    fn marker_is_a_plain_substring_match() {
        // A longer ID that starts with the same digits also matches.
        assert!(contains_build_failure("buildID: 123\nstatus: failed", "12"));
    }
}
