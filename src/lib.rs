//! Core library entry for the `failwatch` CLI.
//!
//! Turns the failures in a JUnit-style test report into tracking-issue
//! changes: failing tests get an open issue carrying a record of the
//! build, and open issues whose tests pass again are closed.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod logging;
pub mod payload;
pub mod ports;
pub mod reconcile;
pub mod report;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
