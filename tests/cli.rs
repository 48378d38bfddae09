//! Binary-level tests: the fail-fast path only exists in a real process, so
//! these run the `guardstack` executable and inspect its exit and output.

use std::process::{Command, Output};

fn run_guardstack(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_guardstack"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("GUARDSTACK_PROTECTION")
        .output()
        .expect("failed to run guardstack")
}

#[test]
fn test_abort_policy_dumps_then_kills_process() {
    let output = run_guardstack(&["corrupt", "byte-after-data", "--abort"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "corrupted stack must not exit cleanly");
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(6), "expected SIGABRT");
    }

    assert!(stderr.contains("Dump from push()"), "stderr:\n{}", stderr);
    assert!(stderr.contains("Someone irrupted right data canary"));
    assert!(stderr.contains("Data canaries:"));
    // The process died at the failed check, before the report path ran.
    assert!(!stderr.contains("detected:"));
}

#[test]
fn test_report_policy_prints_dump_and_fails() {
    let output = run_guardstack(&["corrupt", "byte-after-data"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("Dump from push()"), "stdout:\n{}", stdout);
    assert!(stdout.contains("(IRRUPTION)"));
    assert!(stderr.contains("detected: integrity check failed"));
}

#[test]
fn test_corrupt_json_names_kind() {
    let output = run_guardstack(&["corrupt", "slot", "--json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json dump");
    assert_eq!(report["failure"], "data_checksum_mismatch");
}

#[test]
fn test_structural_level_misses_interior_write() {
    let output = run_guardstack(&["corrupt", "slot", "--protection", "structural"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("went unnoticed"));
}

#[test]
fn test_demo_pops_in_reverse() {
    let output = run_guardstack(&["demo", "--protection", "full"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    let pops: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split(" pop ").nth(1))
        .filter_map(|rest| rest.split_whitespace().next())
        .collect();
    assert_eq!(pops, vec!["13", "17", "12", "5"]);
    assert!(stdout.contains("verdict: OK"));
}
