//! Unit tests for the CLI runtime that stop before any daemon interaction.

use std::ffi::OsString;
use std::process::ExitCode;

use rstest::rstest;

use super::run;

fn invoke(args: &[&str]) -> (ExitCode, String, String) {
    let argv: Vec<OsString> = std::iter::once("leakwatch")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(argv, &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("stdout utf8"),
        String::from_utf8(stderr).expect("stderr utf8"),
    )
}

#[rstest]
#[case::unknown("reload")]
#[case::typo("stat")]
fn unknown_action_lists_valid_choices(#[case] action: &str) {
    let (code, stdout, stderr) = invoke(&[action]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert_eq!(
        stderr,
        format!("Unknown action: {action} valid choices: start|stop|restart|status\n")
    );
}

#[rstest]
#[case::start_without_hub(&["start", "--client", "basement"], "Missing `hub` configuration.\n")]
#[case::start_without_client(
    &["start", "--serverless-hub", "https://hub.example/alert"],
    "Missing `client_id` configuration.\n"
)]
#[case::restart_without_anything(&["restart"], "Missing `hub` configuration.\n")]
#[case::legacy_flag_without_client(
    &["start", "--serverlessHub", "https://hub.example/alert", "-c", " "],
    "Missing `client_id` configuration.\n"
)]
fn launching_without_configuration_fails_fast(#[case] args: &[&str], #[case] expected: &str) {
    let (code, _, stderr) = invoke(args);
    assert_eq!(code, ExitCode::FAILURE);
    assert_eq!(stderr, expected);
}

#[test]
fn invalid_hub_is_reported() {
    let (code, _, stderr) = invoke(&["start", "-s", "not a url", "-c", "basement"]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stderr.starts_with("invalid hub URL 'not a url'"), "{stderr}");
}

#[test]
fn missing_action_is_a_usage_error() {
    let (code, stdout, stderr) = invoke(&[]);
    assert_eq!(code, ExitCode::FAILURE);
    assert!(stdout.is_empty());
    assert!(stderr.contains("<ACTION>"), "{stderr}");
}

#[test]
fn help_goes_to_stdout() {
    let (code, stdout, stderr) = invoke(&["--help"]);
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(stdout.contains("--serverless-hub"), "{stdout}");
    assert!(stderr.is_empty());
}
