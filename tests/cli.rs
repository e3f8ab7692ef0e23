use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn rollbook(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rollbook").unwrap();
    cmd.current_dir(home)
        .env("ROLLBOOK_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn add_student(home: &Path, name: &str, roll: &str, email: &str) {
    rollbook(home)
        .args(["add", "--name", name, "--branch", "CS", "--class", "FE"])
        .args(["--roll", roll, "--email", email])
        .assert()
        .success()
        .stdout(predicate::str::contains("Student added successfully"));
}

#[test]
fn test_add_and_list() {
    let temp_dir = tempfile::tempdir().unwrap();
    add_student(temp_dir.path(), "John Doe", "101", "john.doe@example.com");

    rollbook(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("John Doe"))
        .stdout(predicate::str::contains("101"));

    assert!(temp_dir.path().join("student-records.json").exists());
}

#[test]
fn test_empty_list() {
    let temp_dir = tempfile::tempdir().unwrap();
    rollbook(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No students found."));
}

#[test]
fn test_duplicate_roll_number_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    add_student(temp_dir.path(), "John Doe", "101", "john.doe@example.com");

    rollbook(temp_dir.path())
        .args(["add", "--name", "Jane Smith", "--branch", "IT", "--class", "SE"])
        .args(["--roll", "101", "--email", "jane.smith@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Roll number must be unique"));
}

#[test]
fn test_invalid_form_reports_every_field() {
    let temp_dir = tempfile::tempdir().unwrap();
    rollbook(temp_dir.path())
        .args(["add", "--name", "Jo", "--roll=-4", "--email", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Name must be at least 3 characters"))
        .stderr(predicate::str::contains("Branch is required"))
        .stderr(predicate::str::contains("Please enter a valid email address"));

    assert!(!temp_dir.path().join("student-records.json").exists());
}

#[test]
fn test_search_filters_rows() {
    let temp_dir = tempfile::tempdir().unwrap();
    add_student(temp_dir.path(), "John Doe", "101", "john.doe@example.com");
    add_student(temp_dir.path(), "Jane Smith", "102", "jane.smith@example.com");

    rollbook(temp_dir.path())
        .args(["search", "SMITH"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jane Smith"))
        .stdout(predicate::str::contains("John Doe").not());
}

#[test]
fn test_delete_unknown_id_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    rollbook(temp_dir.path())
        .args(["delete", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_export_then_import_round_trip() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    add_student(home, "John Doe", "101", "john.doe@example.com");
    add_student(home, "Jane Smith", "102", "jane.smith@example.com");

    rollbook(home)
        .args(["export", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Data Exported"));
    let export = home.join("student_records.json");
    assert!(export.exists());

    rollbook(home).args(["clear", "--yes"]).assert().success();
    rollbook(home)
        .arg("list")
        .assert()
        .stdout(predicate::str::contains("No students found."));

    rollbook(home)
        .arg("import")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 student records imported"));

    rollbook(home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("John Doe"))
        .stdout(predicate::str::contains("Jane Smith"));
}

#[test]
fn test_csv_export_has_header() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    add_student(home, "John Doe", "101", "john.doe@example.com");

    let out = home.join("out");
    std::fs::create_dir(&out).unwrap();
    rollbook(home)
        .args(["export", "csv", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("CSV Exported"));

    let csv = std::fs::read_to_string(out.join("student_records.csv")).unwrap();
    assert!(csv.starts_with("Name,Branch,Class,Roll No,Honours Degree,Email\n"));
    assert!(csv.contains("John Doe"));
}

#[test]
fn test_malformed_import_keeps_records() {
    let temp_dir = tempfile::tempdir().unwrap();
    let home = temp_dir.path();
    add_student(home, "John Doe", "101", "john.doe@example.com");

    let bad = home.join("bad.json");
    std::fs::write(&bad, r#"{"not":"an array"}"#).unwrap();
    rollbook(home)
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import Failed"))
        .stderr(predicate::str::contains("Expected an array of students"));

    rollbook(home)
        .arg("list")
        .assert()
        .stdout(predicate::str::contains("John Doe"));
}

#[test]
fn test_import_rejects_non_json_name() {
    let temp_dir = tempfile::tempdir().unwrap();
    let file = temp_dir.path().join("records.txt");
    std::fs::write(&file, "[]").unwrap();

    rollbook(temp_dir.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only JSON files are supported"));
}

#[test]
fn test_clear_requires_confirmation() {
    let temp_dir = tempfile::tempdir().unwrap();
    add_student(temp_dir.path(), "John Doe", "101", "john.doe@example.com");

    rollbook(temp_dir.path())
        .arg("clear")
        .assert()
        .failure()
        .stdout(predicate::str::contains("--yes"));

    rollbook(temp_dir.path())
        .arg("list")
        .assert()
        .stdout(predicate::str::contains("John Doe"));
}

#[test]
fn test_theme_toggle_persists() {
    let temp_dir = tempfile::tempdir().unwrap();
    rollbook(temp_dir.path())
        .arg("theme")
        .assert()
        .success()
        .stdout(predicate::str::contains("theme = light"));

    rollbook(temp_dir.path())
        .args(["theme", "toggle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("theme = dark"));

    rollbook(temp_dir.path())
        .arg("theme")
        .assert()
        .stdout(predicate::str::contains("theme = dark"));
}

#[test]
fn test_config_set_and_show() {
    let temp_dir = tempfile::tempdir().unwrap();
    rollbook(temp_dir.path())
        .args(["config", "max-import-bytes", "10"])
        .assert()
        .success();

    rollbook(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max-import-bytes = 10"));

    let file = temp_dir.path().join("big.json");
    std::fs::write(&file, "[                       ]").unwrap();
    rollbook(temp_dir.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File size exceeds the limit"));
}
