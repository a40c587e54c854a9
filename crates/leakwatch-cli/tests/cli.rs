//! Integration tests for the `leakwatch` binary.
//!
//! Every invocation points the PID marker and log file into a temporary
//! directory. No test reaches detachment: `start` is only exercised on paths
//! that fail before forking. Once logging is set up the console sink shares
//! stderr with operator messages, so those assertions match by substring.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const VANISHED_PID: u32 = 2_147_483_632;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn pid_file(&self) -> PathBuf {
        self.dir.path().join("water-sensor.pid")
    }

    fn log_file(&self) -> PathBuf {
        self.dir.path().join("water-sensor.log")
    }

    fn command(&self, action: &str) -> assert_cmd::Command {
        let mut command = cargo_bin_cmd!("leakwatch");
        for variable in [
            "LEAKWATCH_HUB",
            "LEAKWATCH_CLIENT",
            "LEAKWATCH_PID_FILE",
            "LEAKWATCH_LOG_FILE",
            "LEAKWATCH_LOG",
            "LEAKWATCH_PIN",
        ] {
            command.env_remove(variable);
        }
        command
            .arg(action)
            .arg("--pid-file")
            .arg(self.pid_file())
            .arg("--log-file")
            .arg(self.log_file());
        command
    }
}

#[fixture]
fn sandbox() -> Sandbox {
    Sandbox {
        dir: TempDir::new().expect("temp dir"),
    }
}

#[rstest]
fn status_reports_not_running(sandbox: Sandbox) {
    sandbox
        .command("status")
        .assert()
        .success()
        .stderr(contains("Daemon not running\n"));
    assert!(!sandbox.pid_file().exists());
    let log = fs::read_to_string(sandbox.log_file()).expect("log file written");
    assert!(log.contains("dispatching action"), "{log}");
}

#[rstest]
fn status_reports_running_instance(sandbox: Sandbox) {
    let live = std::process::id();
    fs::write(sandbox.pid_file(), format!("{live}\n")).expect("seed marker");
    sandbox
        .command("STATUS")
        .assert()
        .success()
        .stderr(contains(format!("Daemon running (pid: {live})\n")));
}

#[rstest]
fn status_reports_stale_marker_without_removing_it(sandbox: Sandbox) {
    fs::write(sandbox.pid_file(), format!("{VANISHED_PID}\n")).expect("seed marker");
    sandbox
        .command("status")
        .assert()
        .success()
        .stderr(contains(format!(
            "pidfile {} exists, but pid {VANISHED_PID} is not active.\n",
            sandbox.pid_file().display()
        )));
    assert!(sandbox.pid_file().exists());
}

#[rstest]
fn stop_when_not_running_is_not_an_error(sandbox: Sandbox) {
    sandbox
        .command("stop")
        .assert()
        .success()
        .stderr(contains(format!(
            "pidfile {} does not exist. Daemon stopped?\n",
            sandbox.pid_file().display()
        )));
    assert!(!sandbox.pid_file().exists());
}

#[rstest]
fn stop_interrupts_recorded_process(sandbox: Sandbox) {
    let mut child = Command::new("sleep")
        .arg("30")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn sleep");
    let pid = child.id();
    let reaper = thread::spawn(move || child.wait());
    fs::write(sandbox.pid_file(), format!("{pid}\n")).expect("seed marker");

    sandbox.command("stop").assert().success();

    let status = reaper.join().expect("reaper thread").expect("wait status");
    assert!(!status.success(), "sleep was interrupted");
    assert!(!sandbox.pid_file().exists());
}

#[rstest]
fn start_refuses_when_instance_is_live(sandbox: Sandbox) {
    let live = std::process::id();
    fs::write(sandbox.pid_file(), format!("{live}\n")).expect("seed marker");
    sandbox
        .command("start")
        .args(["-s", "https://hub.example/alert", "-c", "basement"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains(format!("Daemon running (pid: {live})\n")));
    assert_eq!(
        fs::read_to_string(sandbox.pid_file()).expect("marker intact"),
        format!("{live}\n")
    );
}

#[rstest]
#[case::start("start")]
#[case::restart("restart")]
fn launching_without_hub_fails_before_touching_anything(sandbox: Sandbox, #[case] action: &str) {
    sandbox
        .command(action)
        .args(["--client", "basement"])
        .assert()
        .failure()
        .code(1)
        .stderr("Missing `hub` configuration.\n");
    assert!(!sandbox.pid_file().exists());
    assert!(!sandbox.log_file().exists(), "validation precedes log set-up");
}

#[rstest]
fn configuration_is_read_from_the_environment(sandbox: Sandbox) {
    sandbox
        .command("start")
        .env("LEAKWATCH_HUB", "https://hub.example/alert")
        .assert()
        .failure()
        .stderr("Missing `client_id` configuration.\n");
}

#[rstest]
fn unknown_action_exits_non_zero(sandbox: Sandbox) {
    sandbox
        .command("reload")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Unknown action: reload").and(contains("start|stop|restart")));
}
