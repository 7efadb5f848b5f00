//! Record-replay round trip of a reconciliation pass.
//!
//! A pass against the in-memory tracker is recorded into per-port
//! cassettes, then replayed twice. Each replay must report the same
//! actions without touching any live store.

use std::sync::Arc;

use failwatch::adapters::memory::InMemoryIssueTracker;
use failwatch::cassette::config::CassetteConfig;
use failwatch::cassette::session::RecordingSession;
use failwatch::config::Settings;
use failwatch::context::ServiceContext;
use failwatch::payload::{handle_payload, InvocationPayload};
use failwatch::ports::{Issue, IssueState};
use failwatch::reconcile::{IssueAction, ReconcileReport};

const REPORT: &str = r#"<testsuites>
  <testsuite name="github.com/org/repo/pkg/foo">
    <testcase name="TestBar"><failure/></testcase>
  </testsuite>
</testsuites>"#;

fn payload() -> InvocationPayload {
    InvocationPayload {
        repo_owner: "org".into(),
        repo_name: "repo".into(),
        build_id: Some("31".into()),
        build_url: Some("https://ci.example.com/31".into()),
        xunit_report_text: Some(REPORT.into()),
    }
}

async fn pass(ctx: &ServiceContext) -> ReconcileReport {
    handle_payload(ctx, &payload(), &Settings::default()).await.unwrap().unwrap()
}

#[tokio::test]
async fn record_then_replay_produces_identical_actions() {
    let root = std::env::temp_dir().join("failwatch_record_replay_test");
    let _ = std::fs::remove_dir_all(&root);

    let tracker = Arc::new(InMemoryIssueTracker::with_issues(
        "test-failure",
        vec![Issue {
            id: 50,
            number: 5,
            title: "pkg/old: TestGone failed".into(),
            body: String::new(),
            state: IssueState::Open,
        }],
    ));

    // --- Record ---
    let session = RecordingSession::new(&root).unwrap();
    let ctx = ServiceContext::with_tracker(Box::new(Arc::clone(&tracker))).recorded_into(&session);
    let recorded = pass(&ctx).await;
    drop(ctx);
    let dir = session.finish().unwrap();

    assert_eq!(recorded.created(), 1);
    assert!(recorded.actions.contains(&IssueAction::Closed {
        number: 5,
        title: "pkg/old: TestGone failed".into()
    }));
    let calls_after_recording = tracker.calls().len();

    // --- Replay, twice ---
    for _ in 0..2 {
        let ctx = ServiceContext::replaying_from(&CassetteConfig::from_session_dir(&dir)).unwrap();
        assert_eq!(pass(&ctx).await, recorded);
    }
    assert_eq!(tracker.calls().len(), calls_after_recording);

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn recorded_tracker_error_replays_as_error() {
    let root = std::env::temp_dir().join("failwatch_record_replay_error_test");
    let _ = std::fs::remove_dir_all(&root);

    let tracker = Arc::new(InMemoryIssueTracker::new());
    tracker.fail_on("create_issue", 1);

    let session = RecordingSession::new(&root).unwrap();
    let ctx = ServiceContext::with_tracker(Box::new(Arc::clone(&tracker))).recorded_into(&session);
    let recorded_err = handle_payload(&ctx, &payload(), &Settings::default()).await.unwrap_err();
    drop(ctx);
    let dir = session.finish().unwrap();

    let ctx = ServiceContext::replaying_from(&CassetteConfig::from_session_dir(&dir)).unwrap();
    let replayed_err = handle_payload(&ctx, &payload(), &Settings::default()).await.unwrap_err();

    assert_eq!(replayed_err.to_string(), recorded_err.to_string());

    let _ = std::fs::remove_dir_all(&root);
}
