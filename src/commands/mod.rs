//! Command dispatch and handlers.

pub mod handle;
pub mod parse;
pub mod reconcile;

use std::future::Future;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::{self, Settings};
use crate::context::ServiceContext;

/// Dispatch a parsed command line to its handler.
///
/// When `FAILWATCH_RECORD` is set to a directory path, all port
/// interactions are recorded to per-port cassette files under it.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Command::Parse { path } => parse::run(path),
        Command::Reconcile { dry_run, .. } | Command::Handle { dry_run, .. } => {
            with_context(&cli.global.settings(*dry_run), |ctx, settings| {
                dispatch_with_context(&cli.command, ctx, settings)
            })
        }
    }
}

/// Dispatch a command with the given service context.
fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    settings: &Settings,
) -> Result<(), String> {
    match command {
        Command::Reconcile { owner, repo, build_id, build_url, report, .. } => {
            let args = reconcile::ReconcileArgs { owner, repo, build_id, build_url, report };
            reconcile::run_with_context(ctx, &args, settings)
        }
        Command::Handle { payload, .. } => {
            handle::run_with_context(ctx, payload.as_deref(), settings)
        }
        Command::Parse { path } => parse::run(path),
    }
}

/// Build the live (or recording) context, run `f`, then finish any recording.
fn with_context<F>(settings: &Settings, f: F) -> Result<(), String>
where
    F: FnOnce(&ServiceContext, &Settings) -> Result<(), String>,
{
    let Some(dir) = config::record_dir() else {
        let ctx = ServiceContext::live(settings)?;
        return f(&ctx, settings);
    };

    let (ctx, session) = ServiceContext::recording(&dir, settings)?;
    let result = f(&ctx, settings);

    // Adapters hold the recorders until the context is gone.
    drop(ctx);
    finish_recording(session)?;
    result
}

/// Finish a recording session and log the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    info!(dir = %output_dir.display(), "recording saved");
    Ok(())
}

/// Drive `future` to completion on a current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    Ok(runtime.block_on(future))
}

/// Read `path`, or stdin when it is `-`.
pub(crate) fn read_input(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}
