//! Command-line interface runtime for the leakwatch sensor daemon.
//!
//! The module owns argument parsing, start-time validation, telemetry set-up
//! and dispatch of the lifecycle action to the process supervisor. The
//! interface is exercised both from the binary entrypoint and from tests where
//! the IO streams are substituted.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::str::FromStr;

use clap::Parser;
use leakwatchd::{LifecycleOutput, ProcessSupervisor, StopOutcome, telemetry, watch};
use tracing::{debug, info};

mod action;
mod cli;
mod errors;

use action::Action;
use cli::Cli;
use errors::AppError;

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Runs the CLI using the provided arguments and IO handles.
///
/// Operator-facing outcomes are written to `stderr` as single lines. Help and
/// version output go to `stdout`.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut output = LifecycleOutput::new(stdout, stderr);
    match execute(args, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(output.stdout, "{}", error.render());
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(output.stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<I, W, E>(args: I, output: &mut LifecycleOutput<&mut W, &mut E>) -> Result<(), AppError>
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = Cli::try_parse_from(args).map_err(AppError::CliUsage)?;
    let action = Action::from_str(&cli.action).map_err(|_| AppError::UnknownAction {
        action: cli.action.clone(),
    })?;

    match action {
        Action::Start | Action::Restart => {
            // Configuration errors are fatal before anything is stopped or
            // detached.
            let settings = cli.watch_settings(cli.sensor_config()?);
            let supervisor = prepare(&cli, action)?;
            if action == Action::Start {
                supervisor.start(output, || watch(&settings))?;
            } else {
                supervisor.restart(output, || watch(&settings))?;
            }
        }
        Action::Stop => {
            let supervisor = prepare(&cli, action)?;
            if let StopOutcome::Stopped { pid } = supervisor.stop(output)? {
                info!(target: CLI_TARGET, pid, "daemon stopped");
            }
        }
        Action::Status => {
            let state = prepare(&cli, action)?.status(output)?;
            debug!(target: CLI_TARGET, ?state, "status reported");
        }
    }
    Ok(())
}

fn prepare(cli: &Cli, action: Action) -> Result<ProcessSupervisor, AppError> {
    telemetry::initialise(&cli.log_settings())?;
    debug!(
        target: CLI_TARGET,
        %action,
        pid_file = %cli.pid_file.display(),
        "dispatching action"
    );
    Ok(ProcessSupervisor::system(cli.supervisor_settings()))
}

#[cfg(test)]
mod tests;
