//! ---
//! tbus_section: "06-command-line-interface"
//! tbus_subsection: "tests"
//! tbus_type: "test"
//! tbus_scope: "code"
//! tbus_description: "End-to-end checks of the tbus binary."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::io::Write;
use std::process::Output;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use tempfile::NamedTempFile;

fn tbus() -> Command {
    let mut cmd = Command::cargo_bin("tbus").expect("tbus binary");
    cmd.env_remove("TBUS_CONFIG")
        .env_remove("TBUS_LOG")
        .env_remove("RUST_LOG")
        .env("HOME", std::env::temp_dir());
    cmd
}

fn run(args: &[&str]) -> Output {
    tbus().args(args).output().expect("run tbus")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn version_prints_semver() {
    let output = run(&["version"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_flag() {
    let output = run(&["-V"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with(&format!("tbus v{}", env!("CARGO_PKG_VERSION"))));
    assert!(text.contains("Target: "));
}

#[test]
fn help_states_the_backend_is_in_process() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output).split_whitespace().collect::<Vec<_>>().join(" ");
    assert!(text.contains("(in-process backend)"));
    assert!(text.contains("separate invocations never see each other's topics or services"));
}

#[test]
fn empty_bus_has_no_topics_or_services() {
    for args in [["topic", "list"], ["service", "list"]] {
        let output = run(&args);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "");
    }
}

#[test]
fn topic_info_reports_no_publishers() {
    let output = run(&["topic", "info", "-t", "/foo"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "No publishers on topic [/foo]\n");
}

#[test]
fn missing_topic_is_a_diagnostic_not_a_failure() {
    let output = run(&["topic", "info"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("Invalid topic. Topic must not be empty."));
}

#[test]
fn pub_honours_configured_grace() {
    let config = config_file("[publish]\ngrace_period_ms = 0\n");
    let started = Instant::now();
    let output = tbus()
        .arg("--config")
        .arg(config.path())
        .args(["topic", "pub", "-t", "/foo", "-m", "tbus_msgs.StringMsg", "-p", "data: \"Hello\""])
        .output()
        .expect("run tbus");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
    assert_eq!(stderr(&output), "");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn pub_reports_bad_type() {
    let output = run(&["topic", "pub", "-t", "/foo", "-m", "tbus_msgs.Nope", "-p", "data: 1"]);
    assert!(output.status.success());
    assert!(stderr(&output)
        .contains("Unable to create message of type[tbus_msgs.Nope] with data[data: 1]."));
}

#[test]
fn pub_reports_missing_data() {
    let output = run(&["topic", "pub", "-t", "/foo", "-m", "tbus_msgs.StringMsg"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("Message data is null"));
}

#[test]
fn echo_with_duration_returns() {
    let started = Instant::now();
    let output = run(&["topic", "echo", "-t", "/foo", "-d", "0.2"]);
    assert!(output.status.success());
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(stdout(&output), "");
}

#[test]
fn request_without_provider_times_out() {
    let output = run(&[
        "service",
        "req",
        "-s",
        "/echo",
        "--reqtype",
        "tbus_msgs.Int32",
        "--reptype",
        "tbus_msgs.Int32",
        "--timeout",
        "100",
        "-r",
        "data: -1",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("Service call timed out"));
}

#[test]
fn request_without_timeout_is_a_diagnostic() {
    let output = run(&[
        "service", "req", "-s", "/echo", "--reqtype", "tbus_msgs.Int32", "--reptype",
        "tbus_msgs.Int32", "-r", "data: 1",
    ]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("Timeout is null"));
}

#[test]
fn invalid_configuration_fails() {
    let config = config_file("[publish]\ngrace_period_ms = 600000\n");
    let output = tbus()
        .arg("--config")
        .arg(config.path())
        .args(["topic", "list"])
        .output()
        .expect("run tbus");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load configuration"));
}

#[test]
fn missing_explicit_configuration_fails() {
    let output = run(&["--config", "/nonexistent/tbus.toml", "topic", "list"]);
    assert!(!output.status.success());
}
