/*!
 * Demo Exit Status Tests
 * End-to-end runs of the demo binary in a subprocess
 */

use nix::sys::signal::Signal;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Output};

fn run_demo(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sigdispatch-demo"))
        .args(["--workers", "2", "--timeout-ms", "10000"])
        .args(args)
        .env("SIGDISPATCH_MANAGE_TERMINAL", "0")
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn demo")
}

#[test]
fn test_graceful_stop_exits_zero() {
    let output = run_demo(&["--raise", "INT", "--stats-json"]);
    assert!(output.status.success(), "status: {:?}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stats: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(stats["callbacks_invoked"], 1);
    assert_eq!(stats["wait_errors"], 0);
}

#[test]
fn test_handled_critical_signal_exits_non_zero() {
    let output = run_demo(&["--raise", "ABRT"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_unhandled_critical_signal_terminates() {
    let output = run_demo(&["--no-callback", "--raise", "SEGV"]);
    assert_eq!(output.status.code(), None);
    assert_eq!(output.status.signal(), Some(Signal::SIGSEGV as i32));
}

#[test]
fn test_unknown_signal_rejected() {
    let output = run_demo(&["--raise", "CHLD"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}
