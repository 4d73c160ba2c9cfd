//! End-to-end tests for the `memdiag` binary

use assert_cmd::Command;
use predicates::prelude::*;

fn memdiag() -> Command {
    let mut cmd = Command::cargo_bin("memdiag").unwrap();
    cmd.env_remove("MEMDIAG_LOG")
        .env_remove("RUST_LOG")
        .env_remove("MEMDIAG_RAM_SOURCE")
        .env_remove("MEMDIAG_FREE_COMMAND")
        .env_remove("MEMDIAG_INCLUDE_RAM")
        .env("MEMDIAG_LOG_COLORS", "0");
    cmd
}

#[test]
fn maxrss_prints_single_line() {
    memdiag()
        .arg("maxrss")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^maxrss = \d+\n$").unwrap());
}

#[test]
fn demo_groups_identical_tensors() {
    memdiag()
        .args(["demo", "--count", "2", "--shape", "2,3"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("maxrss = "))
        .stdout(predicate::str::contains("('cpu', float32, (2, 3))\t2\n"));
}

#[test]
fn demo_flatten_adds_view_group() {
    memdiag()
        .args([
            "demo", "--count", "3", "--shape", "(2, 2)", "--dtype", "int64", "--device",
            "cuda:1", "--flatten",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "('cuda:1', int64, (2, 2))\t3\n('cuda:1', int64, (4,))\t3\n",
        ));
}

#[test]
fn demo_rejects_unknown_dtype() {
    memdiag()
        .args(["demo", "--dtype", "complex128"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unknown dtype"));
}

#[test]
fn report_without_ram_has_no_ram_line() {
    memdiag()
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("maxrss = "))
        .stdout(predicate::str::contains("RAM memory % used:").not());
}

#[test]
fn ram_with_missing_command_prints_nothing() {
    memdiag()
        .args([
            "ram",
            "--source",
            "command",
            "--free-command",
            "memdiag-no-such-binary -t -m",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to read system RAM usage"));
}

#[cfg(unix)]
#[test]
fn ram_from_command_output() {
    memdiag()
        .args([
            "ram",
            "--source",
            "command",
            "--free-command",
            "echo Total: 1000 250 750",
        ])
        .assert()
        .success()
        .stdout("RAM memory % used: 25.0\n");
}

#[cfg(unix)]
#[test]
fn report_with_ram_appends_line() {
    memdiag()
        .args(["report", "--ram", "--source", "command", "--free-command", "echo Total: 333 111 222"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("RAM memory % used: 33.33\n"));
}

#[test]
fn logs_stay_off_stdout() {
    memdiag()
        .args(["--log-level", "debug", "--log-format", "compact", "maxrss"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^maxrss = \d+\n$").unwrap())
        .stderr(predicate::str::contains("memdiag starting"));
}
