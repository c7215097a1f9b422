//! End-to-end tests of the `zkchat` binary for commands that need no
//! embedding service.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn zkchat_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_zkchat"))
}

fn run(vault: &Path, args: &[&str]) -> Output {
    Command::new(zkchat_binary())
        .arg("--vault")
        .arg(vault)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run zkchat")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_write_then_read() {
    let tmp = TempDir::new().unwrap();

    let out = run(
        tmp.path(),
        &["write", "ideas/Pear.md", "--content", "Pears are green.", "--meta", "tags=[fruit, green]"],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let raw = fs::read_to_string(tmp.path().join("ideas/Pear.md")).unwrap();
    assert_eq!(raw, "---\ntags:\n- fruit\n- green\n---\nPears are green.");

    let out = run(tmp.path(), &["read", "ideas/Pear.md"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("title:    Pear"));
    assert!(text.contains("Pears are green."));
}

#[test]
fn test_write_append() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["write", "Log.md", "--content", "first"]);
    let out = run(tmp.path(), &["write", "Log.md", "--content", "second", "--append"]);
    assert!(out.status.success());

    let raw = fs::read_to_string(tmp.path().join("Log.md")).unwrap();
    assert!(raw.ends_with("first\n\n---\n\nsecond"));
}

#[test]
fn test_list() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.md"), "# Alpha\ntext").unwrap();
    fs::write(tmp.path().join("b.md"), "beta").unwrap();

    let out = run(tmp.path(), &["list"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "a.md\tAlpha\nb.md\tb\n");
}

#[test]
fn test_first_use_writes_config() {
    let tmp = TempDir::new().unwrap();
    let out = run(tmp.path(), &["status"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("last indexed: never"));
    assert!(tmp.path().join(".zk_chat.toml").exists());
    assert!(tmp.path().join(".zk_chat_db/vectors.sqlite").exists());
}

#[test]
fn test_read_missing_fails() {
    let tmp = TempDir::new().unwrap();
    let out = run(tmp.path(), &["read", "missing.md"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("missing.md"));
}

#[test]
fn test_tool_call_requires_unsafe_for_writes() {
    let tmp = TempDir::new().unwrap();
    let out = run(
        tmp.path(),
        &["tool", "call", "delete_zk_document", "--param", "relative_path=a.md"],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--unsafe"));
}

#[test]
fn test_tool_list() {
    let tmp = TempDir::new().unwrap();
    let out = run(tmp.path(), &["tool", "list"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("read_zk_document"));
    assert!(!text.contains("delete_zk_document"));

    let out = run(tmp.path(), &["tool", "list", "--unsafe"]);
    assert!(stdout(&out).contains("delete_zk_document (writes)"));
}

#[test]
fn test_missing_vault_fails() {
    let tmp = TempDir::new().unwrap();
    let out = run(&tmp.path().join("nope"), &["list"]);
    assert!(!out.status.success());
}
