//! Binary entrypoint for the `failwatch` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    failwatch::logging::init();

    // Recording is handled in commands::dispatch via FAILWATCH_RECORD=<dir>.
    match failwatch::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
