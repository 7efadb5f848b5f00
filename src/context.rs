//! Service context bundling all port trait objects.

use std::path::Path;

use crate::adapters::dry_run::DryRunIssueTracker;
use crate::adapters::live::{GitHubIssueTracker, UuidGenerator};
use crate::adapters::recording::{RecordingIdGenerator, RecordingIssueTracker};
use crate::adapters::replaying::{ReplayingIdGenerator, ReplayingIssueTracker};
use crate::cassette::config::CassetteConfig;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Settings;
use crate::ports::{
    Comment, IdGenerator, Issue, IssueFuture, IssueState, IssueTracker, NewIssue, RepoRef,
    StateFilter,
};

/// Bundles all port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying).
pub struct ServiceContext {
    /// Store holding the tracking issues.
    pub issues: Box<dyn IssueTracker>,
    /// Source of invocation IDs.
    pub id_gen: Box<dyn IdGenerator>,
}

impl ServiceContext {
    /// Live context talking to GitHub. Writes are only logged when
    /// `settings.dry_run` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitHub client cannot be built.
    pub fn live(settings: &Settings) -> Result<Self, String> {
        let github = GitHubIssueTracker::new(&settings.github()).map_err(|e| e.to_string())?;
        let issues: Box<dyn IssueTracker> = if settings.dry_run {
            Box::new(DryRunIssueTracker::new(Box::new(github)))
        } else {
            Box::new(github)
        };
        Ok(Self { issues, id_gen: Box::new(UuidGenerator) })
    }

    /// Context over an arbitrary tracker with live invocation IDs.
    #[must_use]
    pub fn with_tracker(issues: Box<dyn IssueTracker>) -> Self {
        Self { issues, id_gen: Box::new(UuidGenerator) }
    }

    /// Live context whose port interactions are recorded into a new
    /// session under `root`.
    ///
    /// The context must be dropped before [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the live context or the session directory
    /// cannot be created.
    pub fn recording(root: &Path, settings: &Settings) -> Result<(Self, RecordingSession), String> {
        let live = Self::live(settings)?;
        let session = RecordingSession::new(root)?;
        Ok((live.recorded_into(&session), session))
    }

    /// Wraps every port of this context in a recording adapter.
    #[must_use]
    pub fn recorded_into(self, session: &RecordingSession) -> Self {
        Self {
            issues: Box::new(RecordingIssueTracker::new(self.issues, session.issues.clone())),
            id_gen: Box::new(RecordingIdGenerator::new(self.id_gen, session.id_gen.clone())),
        }
    }

    /// Replaying context from a single cassette holding every port.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)?;
        Ok(Self {
            issues: Box::new(ReplayingIssueTracker::new(CassetteReplayer::new(&cassette))),
            id_gen: Box::new(ReplayingIdGenerator::new(CassetteReplayer::new(&cassette))),
        })
    }

    /// Replaying context from per-port cassette files. Ports without a
    /// cassette panic when called.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        Ok(Self {
            issues: match replayers.issues {
                Some(r) => Box::new(ReplayingIssueTracker::new(r)),
                None => Box::new(PanickingIssueTracker),
            },
            id_gen: match replayers.id_gen {
                Some(r) => Box::new(ReplayingIdGenerator::new(r)),
                None => Box::new(PanickingIdGenerator),
            },
        })
    }
}

// --- Panicking adapters for unconfigured ports ---

struct PanickingIdGenerator;
impl IdGenerator for PanickingIdGenerator {
    fn generate_id(&self) -> String {
        panic!("IdGenerator port not configured in CassetteConfig: no cassette loaded for id_gen");
    }
}

struct PanickingIssueTracker;
impl PanickingIssueTracker {
    fn unconfigured() -> ! {
        panic!("IssueTracker port not configured in CassetteConfig: no cassette loaded for issues");
    }
}

impl IssueTracker for PanickingIssueTracker {
    fn list_issues<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _label: &'a str,
        _state: StateFilter,
    ) -> IssueFuture<'a, Vec<Issue>> {
        Self::unconfigured()
    }

    fn list_comments<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _number: u64,
    ) -> IssueFuture<'a, Vec<Comment>> {
        Self::unconfigured()
    }

    fn create_issue<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _issue: &'a NewIssue,
    ) -> IssueFuture<'a, Issue> {
        Self::unconfigured()
    }

    fn update_issue_state<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _number: u64,
        _state: IssueState,
    ) -> IssueFuture<'a, Issue> {
        Self::unconfigured()
    }

    fn create_comment<'a>(
        &'a self,
        _repo: &'a RepoRef,
        _number: u64,
        _body: &'a str,
    ) -> IssueFuture<'a, Comment> {
        Self::unconfigured()
    }
}
