#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Write a compiled stream to a temp file and return its path.
fn story(dir: &TempDir, source: &str) -> PathBuf {
    let path = dir.path().join("story.target");
    fs::write(&path, source).unwrap();
    path
}

fn ss() -> Command {
    Command::cargo_bin("ss").unwrap()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_linear_story() {
    let dir = TempDir::new().unwrap();
    let path = story(&dir, "narrate(\"Hello\")\nnarrate(\"world\")\nend()\n");

    ss().args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello").and(predicate::str::contains("world")));
}

#[test]
fn run_follows_a_choice_answer() {
    let dir = TempDir::new().unwrap();
    let path = story(
        &dir,
        concat!(
            "choice(\"Go left\", \"Go right\") -> [la, lb]\n",
            "la:\n",
            "narrate(\"You go left.\")\n",
            "end()\n",
            "lb:\n",
            "narrate(\"You go right.\")\n",
            "end()\n",
        ),
    );

    ss().args(["run", path.to_str().unwrap()])
        .write_stdin("2\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Go right")
                .and(predicate::str::contains("You go right."))
                .and(predicate::str::contains("You go left.").not()),
        );
}

#[test]
fn run_reprompts_on_out_of_range_answer() {
    let dir = TempDir::new().unwrap();
    let path = story(
        &dir,
        "choice(\"A\") -> [a]\na:\nnarrate(\"picked\")\nend()\n",
    );

    ss().args(["run", path.to_str().unwrap()])
        .write_stdin("9\n1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("picked"))
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn run_stores_numeric_input() {
    let dir = TempDir::new().unwrap();
    let path = story(
        &dir,
        "input(age)\nformat_text(age, \"You are {}.\")\nend()\n",
    );

    ss().args(["run", path.to_str().unwrap()])
        .write_stdin("42\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("You are 42."));
}

#[test]
fn run_reports_runtime_errors_and_continues() {
    let dir = TempDir::new().unwrap();
    let path = story(
        &dir,
        "assign(x, 5)\ndivide_by(x, 0)\nnarrate(\"after\")\nend()\n",
    );

    ss().args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("after"))
        .stderr(predicate::str::contains("division by zero"));
}

#[test]
fn run_seeded_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let path = story(
        &dir,
        "randomize(roll, 1000)\nformat_text(roll, \"rolled {}\")\nend()\n",
    );

    let first = ss()
        .args(["run", path.to_str().unwrap(), "--seed", "7"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let second = ss()
        .args(["run", path.to_str().unwrap(), "--seed", "7"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(first, second);
}

#[test]
fn run_state_flag_prints_json_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = story(
        &dir,
        "assign(gold, 7)\ncreate_inventory(\"bag\")\nadd_to_inventory(\"bag\", \"lamp\")\nend()\n",
    );

    let output = ss()
        .args(["run", path.to_str().unwrap(), "--state"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON output");
    assert_eq!(json["variables"]["gold"]["Int"], 7);
    assert_eq!(json["inventories"]["bag"][0], "lamp");
}

#[test]
fn run_fails_on_missing_file() {
    ss().args(["run", "no_such_story.target"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_valid_stream() {
    let dir = TempDir::new().unwrap();
    let path = story(&dir, "start:\nnarrate(\"ok\")\ngoto(done)\ndone:\nend()\n");

    ss().args(["check", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed")
                .and(predicate::str::contains("3 instructions")),
        );
}

#[test]
fn check_fails_on_unresolved_label() {
    let dir = TempDir::new().unwrap();
    let path = story(&dir, "goto(nowhere)\nend()\n");

    ss().args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolved label"));
}

#[test]
fn check_fails_on_unknown_command() {
    let dir = TempDir::new().unwrap();
    let path = story(&dir, "frobnicate(\"x\")\n");

    ss().args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown command"));
}

// ---------------------------------------------------------------------------
// dump
// ---------------------------------------------------------------------------

#[test]
fn dump_round_trips_the_stream() {
    let source = "start:\nnarrate(\"Hello\")\nchoice(\"A\", \"B\") -> [start, done]\ndone:\nend()\n";
    let dir = TempDir::new().unwrap();
    let path = story(&dir, source);

    ss().args(["dump", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::eq(source));
}

#[test]
fn dump_fails_on_malformed_stream() {
    let dir = TempDir::new().unwrap();
    let path = story(&dir, "narrate(\"unclosed\"\n");

    ss().args(["dump", path.to_str().unwrap()])
        .assert()
        .failure();
}
