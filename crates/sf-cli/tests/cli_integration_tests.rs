//! Integration tests for the `sf` binary
//!
//! Each test builds a project in a temporary directory and drives it through
//! the CLI, checking output and exit codes.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Path to the compiled sf binary
fn sf_bin() -> String {
    env!("CARGO_BIN_EXE_sf").to_string()
}

/// Run `sf -p <dir> <args>` and return (stdout, stderr, exit code).
fn run_sf(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(sf_bin())
        .arg("-p")
        .arg(dir)
        .args(args)
        .env_remove("SF_TARGET")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute sf with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

const CONFIG: &str = r#"
name: content_db
database:
  type: duckdb
  path: target/dev.duckdb
targets:
  scratch:
    database:
      type: duckdb
      path: target/scratch.duckdb
"#;

const CREATE_RELEASES: &str = r#"
description: Releases table with seed rows
up:
  - create_table:
      table: Releases
      columns:
        - { name: Id, type: INTEGER, nullable: false }
        - { name: Slug, type: VARCHAR }
  - insert_rows:
      table: Releases
      columns: [Id, Slug]
      rows:
        - [1, "2019-20"]
        - [2, ""]
down:
  - drop_table: { table: Releases }
"#;

const ADD_TIME_IDENTIFIER: &str = r#"
up:
  - add_column:
      table: Releases
      column: { name: TimePeriodCoverage, type: INTEGER, nullable: false, default: 0 }
down:
  - drop_column: { table: Releases, column: TimePeriodCoverage }
"#;

const GRANT_UPDATE: &str = r#"
irreversible: permission grants are forward-only
up:
  - grant: { privileges: [update], table: Releases, role: publisher }
"#;

fn write_project(dir: &Path) {
    let migrations = dir.join("migrations");
    fs::create_dir_all(&migrations).unwrap();
    fs::write(dir.join("schemaflow.yml"), CONFIG).unwrap();
    for (name, content) in [
        ("20180101000000_CreateReleases.yml", CREATE_RELEASES),
        ("20190101000000_AddTimeIdentifierToRelease.yml", ADD_TIME_IDENTIFIER),
        ("20230905140307_GrantUpdateOnReleases.yml", GRANT_UPDATE),
    ] {
        fs::write(migrations.join(name), content).unwrap();
    }
}

fn add_migration(dir: &Path, file: &str, content: &str) {
    fs::write(dir.join("migrations").join(file), content).unwrap();
}

// ── Init / New ──────────────────────────────────────────────────────────

#[test]
fn test_init_then_new() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(sf_bin())
        .args(["init", "content_db"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let project = dir.path().join("content_db");
    assert!(project.join("schemaflow.yml").is_file());
    assert!(project.join("migrations").is_dir());

    let (stdout, _, code) = run_sf(&project, &["new", "CreateReleases", "--sql"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("_CreateReleases.yml"), "{}", stdout);
    assert!(stdout.contains("up.sql"), "{}", stdout);

    // A second unit with the same name is refused
    let (_, stderr, code) = run_sf(&project, &["new", "CreateReleases"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"), "{}", stderr);
}

#[test]
fn test_init_rejects_existing_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("content_db")).unwrap();
    let output = Command::new(sf_bin())
        .args(["init", "content_db"])
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

// ── Up / Down / Status ──────────────────────────────────────────────────

#[test]
fn test_up_status_down_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let (stdout, _, code) = run_sf(dir.path(), &["up", "--dry-run"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("CREATE TABLE"), "{}", stdout);
    assert!(stdout.contains("-- skipped: duckdb has no roles"), "{}", stdout);

    // Dry run leaves everything pending
    let (stdout, _, _) = run_sf(dir.path(), &["status", "--output", "json"]);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(status
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["state"] == "pending"));

    let (stdout, _, code) = run_sf(dir.path(), &["up"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Applied 3 migrations"), "{}", stdout);
    assert!(dir.path().join("target").join("dev.duckdb").is_file());

    let (stdout, _, code) = run_sf(dir.path(), &["up"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("up to date"), "{}", stdout);

    let (stdout, _, code) = run_sf(dir.path(), &["status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("3 applied, 0 pending"), "{}", stdout);

    // The newest unit is forward-only
    let (_, stderr, code) = run_sf(dir.path(), &["down"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("[L004]"), "{}", stderr);

    let (stdout, _, code) = run_sf(
        dir.path(),
        &["down", "--to", "CreateReleases", "--allow-irreversible"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Reverted 2 migrations"), "{}", stdout);
    assert!(stdout.contains("history entry removed"), "{}", stdout);

    let (stdout, _, _) = run_sf(dir.path(), &["status"]);
    assert!(stdout.contains("1 applied, 2 pending"), "{}", stdout);
}

#[test]
fn test_target_selects_database() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let (_, _, code) = run_sf(dir.path(), &["--target", "scratch", "up", "--to", "CreateReleases"]);
    assert_eq!(code, 0);
    assert!(dir.path().join("target").join("scratch.duckdb").is_file());
    assert!(!dir.path().join("target").join("dev.duckdb").exists());
}

#[test]
fn test_failed_statement_exits_with_database_code() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    add_migration(
        dir.path(),
        "20240101000000_BackfillMissingTable.yml",
        "up:\n  - sql: INSERT INTO Permalinks VALUES (1)\ndown:\n  - sql: DELETE FROM Permalinks\n",
    );

    let (_, stderr, code) = run_sf(dir.path(), &["up"]);
    assert_eq!(code, 4);
    assert!(stderr.contains("[L006]"), "{}", stderr);

    // Units before the failing one stay applied
    let (stdout, _, _) = run_sf(dir.path(), &["status"]);
    assert!(stdout.contains("3 applied, 1 pending"), "{}", stdout);
}

// ── Render / Lint ───────────────────────────────────────────────────────

#[test]
fn test_render_for_postgres() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let (stdout, _, code) = run_sf(
        dir.path(),
        &["render", "GrantUpdateOnReleases", "--dialect", "postgres"],
    );
    assert_eq!(code, 0);
    assert!(
        stdout.contains(r#"GRANT UPDATE ON "Releases" TO "publisher";"#),
        "{}",
        stdout
    );

    let (stdout, _, code) = run_sf(dir.path(), &["render", "GrantUpdateOnReleases", "--down"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("irreversible (permission grants are forward-only)"));
}

#[test]
fn test_lint_fails_on_not_null_without_default() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let (stdout, _, code) = run_sf(dir.path(), &["lint"]);
    assert_eq!(code, 0, "{}", stdout);
    assert!(stdout.contains("irreversible: permission grants are forward-only"));

    add_migration(
        dir.path(),
        "20240101000000_AddRequiredYear.yml",
        r#"
up:
  - add_column:
      table: Releases
      column: { name: Year, type: INTEGER, nullable: false }
down:
  - drop_column: { table: Releases, column: Year }
"#,
    );
    let (stdout, _, code) = run_sf(dir.path(), &["lint"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("NOT NULL without a default"), "{}", stdout);
}

// ── Verify / Snapshot / Check ───────────────────────────────────────────

#[test]
fn test_verify_passes_and_reports_lossy_down() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let (stdout, _, code) = run_sf(dir.path(), &["verify"]);
    assert_eq!(code, 0, "{}", stdout);
    assert!(stdout.contains("2 passed, 1 skipped, 0 failed"), "{}", stdout);

    add_migration(
        dir.path(),
        "20240101000000_BlankSlugs.yml",
        "up:\n  - sql: UPDATE Releases SET Slug = ''\ndown:\n  - sql: SELECT 1\n",
    );
    let (stdout, _, code) = run_sf(dir.path(), &["verify", "--only", "BlankSlugs"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("row data differs"), "{}", stdout);
}

#[test]
fn test_snapshot_then_check() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let (_, stderr, code) = run_sf(dir.path(), &["check"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("sf snapshot"), "{}", stderr);

    let (stdout, _, code) = run_sf(dir.path(), &["snapshot"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("1 tables, 2 rows"), "{}", stdout);
    assert!(dir.path().join("schema_snapshot.json").is_file());

    let (_, _, code) = run_sf(dir.path(), &["check"]);
    assert_eq!(code, 0);

    add_migration(
        dir.path(),
        "20240101000000_RemoveEmptyRelease.yml",
        r#"
up:
  - delete_rows: { table: Releases, filter: { Id: 2 } }
down:
  - insert_rows:
      table: Releases
      columns: [Id, Slug, TimePeriodCoverage]
      rows:
        - [2, "", 0]
"#,
    );
    let (stdout, _, code) = run_sf(dir.path(), &["check"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("expected 2 rows, found 1"), "{}", stdout);

    // Structure is unchanged
    let (_, _, code) = run_sf(dir.path(), &["check", "--schema-only"]);
    assert_eq!(code, 0);
}
