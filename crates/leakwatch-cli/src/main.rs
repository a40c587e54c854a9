//! CLI entrypoint for the leakwatch water-leak sensor daemon.
//!
//! The binary delegates to [`leakwatch_cli::run`], which parses the action and
//! options and drives the daemon lifecycle.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // The detached worker logs from a second thread, so the console handles
    // must not stay locked for the life of the process.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    leakwatch_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
