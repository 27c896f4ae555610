//! End-to-end tests for the `fitness-import` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const CONFIG: &str = r#"
[[fitness_warnings]]
target_package = "legacy"
exceptions = ["legacy.compat"]
allowed_number = 1

[[fitness_warnings]]
target_package = "requests"
restriction_type = "report"
"#;

fn fitness_import(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fitness-import"))
        .args(args)
        .current_dir(dir)
        .env_remove("FITNESS_IMPORT_CONFIG")
        .env("FITNESS_IMPORT_CONFIG_DIR", dir.join(".no-global"))
        .output()
        .expect("binary should run")
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("fitness-import.toml"), CONFIG).unwrap();
    for (rel, body) in files {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
    tmp
}

#[test]
fn passing_check_exits_zero() {
    let tmp = project(&[
        ("app/a.py", "import legacy.old\nimport legacy.compat.ok\n"),
        ("app/b.py", "import requests\n"),
    ]);
    let out = fitness_import(tmp.path(), &["check"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(0), "{stdout}");
    assert!(stdout.contains("fitness report summary (passed)"));
    assert!(stdout.contains("legacy: Had 1 occurrences, is allowed 1"));
    assert!(stdout.contains("requests: Had 1 occurrences"));
    assert!(!stdout.contains('\x1b'));
}

#[test]
fn failing_check_exits_one() {
    let tmp = project(&[
        ("app/a.py", "import legacy.old\n"),
        ("app/b.py", "from legacy.http import get\n"),
    ]);
    let out = fitness_import(tmp.path(), &["check", "--format", "compact"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(1), "{stdout}");
    assert!(stdout.contains("app/a.py:1: [fail] legacy: import legacy.old"));
    assert!(stdout.contains("app/b.py:1: [fail] legacy: from legacy.http"));
}

#[test]
fn exclude_flag_skips_files() {
    let tmp = project(&[
        ("app/a.py", "import legacy.old\n"),
        ("gen/b.py", "import legacy.gen\n"),
    ]);
    let out = fitness_import(tmp.path(), &["check", "--exclude", "gen/*"]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn json_output_is_parseable() {
    let tmp = project(&[("a.py", "import requests\ndef broken(:\n")]);
    let out = fitness_import(tmp.path(), &["check", "--format", "json"]);

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["failed"], false);
    assert_eq!(report["files_analyzed"], 0);
    assert_eq!(report["errors"][0]["kind"], "parse");
    assert_eq!(report["errors"][0]["path"], "a.py");
}

#[test]
fn invalid_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("fitness-import.toml"),
        "[[fitness_warnings]]\ntarget_package = \"x\"\nrestriction_type = \"sometimes\"\n",
    )
    .unwrap();
    let out = fitness_import(tmp.path(), &["check"]);

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("sometimes"));
}

#[test]
fn list_rules_shows_configured_rules() {
    let tmp = project(&[]);
    let out = fitness_import(tmp.path(), &["list-rules"]);
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert!(out.status.success());
    assert!(stdout.contains("legacy"));
    assert!(stdout.contains("legacy.compat"));
    assert!(stdout.contains("report"));
}

#[test]
fn init_writes_config_once() {
    let tmp = TempDir::new().unwrap();
    assert!(fitness_import(tmp.path(), &["init"]).status.success());
    assert!(tmp.path().join("fitness-import.toml").exists());
    assert!(!fitness_import(tmp.path(), &["init"]).status.success());
    assert!(fitness_import(tmp.path(), &["init", "--force"]).status.success());
}
