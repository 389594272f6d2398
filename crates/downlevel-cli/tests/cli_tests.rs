//! Integration tests for the downlevel binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MODERN: &str = "namespace App;\n\nclass Person\n{\n    public string Name { get; init; }\n}\n";
const LOWERED: &str =
    "namespace App\n{\n\nclass Person\n{\n    public string Name { get; set; }\n}\n}\n";
const OLDER: &str = "class Legacy\n{\n    int Count() { return 1; }\n}\n";

#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("downlevel").unwrap()
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("downlevel"))
        .stdout(predicate::str::contains("--check"))
        .stdout(predicate::str::contains("--diff"));
}

#[test]
fn test_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_rewrites_in_place() {
    let dir = project(&[("src/Person.cs", MODERN), ("src/Legacy.cs", OLDER)]);

    cli()
        .arg("--no-color")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Downgraded"))
        .stdout(predicate::str::contains("Person.cs"))
        .stdout(predicate::str::contains("Unchanged: 1"));

    assert_eq!(read(dir.path(), "src/Person.cs"), LOWERED);
    assert_eq!(read(dir.path(), "src/Legacy.cs"), OLDER);
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = project(&[("Person.cs", MODERN)]);

    cli().arg(dir.path()).assert().success();
    cli()
        .arg("--no-color")
        .arg("--check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Would downgrade: 0"));
}

#[test]
fn test_check_reports_without_writing() {
    let dir = project(&[("Person.cs", MODERN)]);

    cli()
        .arg("--no-color")
        .arg("--check")
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Would downgrade"))
        .stdout(predicate::str::contains("Person.cs"));

    assert_eq!(read(dir.path(), "Person.cs"), MODERN);
}

#[test]
fn test_check_passes_on_older_code() {
    let dir = project(&[("Legacy.cs", OLDER)]);

    cli().arg("--check").arg(dir.path()).assert().success();
}

#[test]
fn test_diff_prints_unified_diff() {
    let dir = project(&[("Person.cs", MODERN)]);

    cli()
        .arg("--no-color")
        .arg("--diff")
        .arg(dir.path().join("Person.cs"))
        .assert()
        .success()
        .stdout(predicate::str::contains("--- "))
        .stdout(predicate::str::contains("+++ "))
        .stdout(predicate::str::contains("-    public string Name { get; init; }"))
        .stdout(predicate::str::contains("+    public string Name { get; set; }"));

    assert_eq!(read(dir.path(), "Person.cs"), MODERN);
}

#[test]
fn test_check_and_diff_conflict() {
    cli().args(["--check", "--diff", "."]).assert().failure();
}

#[test]
fn test_backup_keeps_original() {
    let dir = project(&[("Person.cs", MODERN)]);

    cli().arg("--backup").arg(dir.path()).assert().success();

    assert_eq!(read(dir.path(), "Person.cs"), LOWERED);
    assert_eq!(read(dir.path(), "Person.cs.bak"), MODERN);
}

#[test]
fn test_parse_failure_leaves_file_untouched() {
    let broken = "class Broken {\n    void M( \n";
    let dir = project(&[("Broken.cs", broken), ("Person.cs", MODERN)]);

    cli()
        .arg("--no-color")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parse failed"))
        .stdout(predicate::str::contains("Parse failures: 1"));

    assert_eq!(read(dir.path(), "Broken.cs"), broken);
    assert_eq!(read(dir.path(), "Person.cs"), LOWERED);
}

#[test]
fn test_generated_files_are_skipped() {
    let dir = project(&[("Person.g.cs", MODERN), ("Form1.Designer.cs", MODERN)]);

    cli()
        .arg("--no-color")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated files skipped: 2"));

    assert_eq!(read(dir.path(), "Person.g.cs"), MODERN);
}

#[test]
fn test_excluded_directories() {
    let dir = project(&[("obj/Debug/Person.cs", MODERN)]);

    cli().arg(dir.path()).assert().success();

    assert_eq!(read(dir.path(), "obj/Debug/Person.cs"), MODERN);
}

#[test]
fn test_config_disables_pass() {
    let dir = project(&[
        (
            ".downlevelrc.json",
            r#"{ "passes": { "initAccessors": false, "fileScopedNamespaces": false } }"#,
        ),
        ("Person.cs", MODERN),
    ]);

    cli()
        .arg("--check")
        .arg(dir.path())
        .assert()
        .success();

    assert_eq!(read(dir.path(), "Person.cs"), MODERN);
}

#[test]
fn test_explicit_config_file() {
    let dir = project(&[
        ("settings/downlevel.toml", "[passes]\nfileScopedNamespaces = false\n"),
        ("Person.cs", MODERN),
    ]);

    cli()
        .arg("--config")
        .arg(dir.path().join("settings/downlevel.toml"))
        .arg(dir.path().join("Person.cs"))
        .assert()
        .success();

    assert_eq!(
        read(dir.path(), "Person.cs"),
        "namespace App;\n\nclass Person\n{\n    public string Name { get; set; }\n}\n"
    );
}

#[test]
fn test_invalid_config_fails() {
    let dir = project(&[(".downlevelrc.json", "{ not json"), ("Person.cs", MODERN)]);

    cli()
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));

    assert_eq!(read(dir.path(), "Person.cs"), MODERN);
}

#[test]
fn test_missing_path_fails() {
    let dir = TempDir::new().unwrap();

    cli()
        .arg(dir.path().join("nope"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_schema_command() {
    let output = cli().arg("schema").output().unwrap();
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(schema["properties"]["passes"].is_object());
    assert!(schema["properties"]["files"].is_object());
}
