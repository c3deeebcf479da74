//! Integration tests for the `livepreview` binary
//!
//! Every invocation points `--data-dir` at a temp directory so nothing
//! touches the real home directory.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn livepreview(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("livepreview").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn write_sources(dir: &Path) {
    fs::write(
        dir.join("index.html"),
        "<!DOCTYPE html><html><body><p>hello</p></body></html>",
    )
    .unwrap();
    fs::write(dir.join("style.css"), "p { color: teal; }").unwrap();
    fs::write(dir.join("app.js"), "console.log('ready');").unwrap();
}

#[test]
fn test_synth_prints_document() {
    let data = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    write_sources(src.path());

    livepreview(data.path())
        .arg("synth")
        .arg("--html")
        .arg(src.path().join("index.html"))
        .arg("--css")
        .arg(src.path().join("style.css"))
        .arg("--js")
        .arg(src.path().join("app.js"))
        .arg("--lib-js")
        .arg("https://cdn.example.com/lib.js")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("<p>hello</p>"))
        .stdout(predicate::str::contains("p { color: teal; }"))
        .stdout(predicate::str::contains("console.log('ready');"))
        .stdout(predicate::str::contains("window.__preview"))
        .stdout(predicate::str::contains(
            r#"<script src="https://cdn.example.com/lib.js"></script>"#,
        ));
}

#[test]
fn test_first_run_writes_config() {
    let data = TempDir::new().unwrap();

    livepreview(data.path()).arg("synth").assert().success();

    assert!(data.path().join("config.toml").exists());
}

#[test]
fn test_save_then_synth_from_snippet() {
    let data = TempDir::new().unwrap();
    let src = TempDir::new().unwrap();
    write_sources(src.path());

    let output = livepreview(data.path())
        .arg("save")
        .arg("--html")
        .arg(src.path().join("index.html"))
        .arg("--title")
        .arg("Greeting")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = String::from_utf8(output).unwrap().trim().to_string();
    assert!(!id.is_empty());

    let saved = fs::read_to_string(data.path().join("snippets").join(format!("{id}.json"))).unwrap();
    assert!(saved.contains("\"title\": \"Greeting\""));

    livepreview(data.path())
        .arg("synth")
        .arg("--snippet")
        .arg(&id)
        .assert()
        .success()
        .stdout(predicate::str::contains("<p>hello</p>"));
}

#[test]
fn test_missing_source_file_fails() {
    let data = TempDir::new().unwrap();

    livepreview(data.path())
        .arg("synth")
        .arg("--html")
        .arg(data.path().join("nope.html"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_snippet_conflicts_with_files() {
    let data = TempDir::new().unwrap();

    livepreview(data.path())
        .args(["synth", "--snippet", "abc", "--html", "x.html"])
        .assert()
        .failure();
}

#[test]
fn test_unknown_snippet_fails() {
    let data = TempDir::new().unwrap();

    livepreview(data.path())
        .args(["synth", "--snippet", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));
}
