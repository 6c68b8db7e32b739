use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn cargo_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ordersheet"))
}

/// Runs the binary against a libsql file, with no `.env` or `DATABASE_*` leakage.
fn run_ordersheet(db: &Path, args: &[&str]) -> Output {
    let workdir = db.parent().expect("database lives in a temp dir");
    let mut command = Command::new(cargo_bin());
    for key in [
        "DATABASE_HOST",
        "DATABASE_PORT",
        "DATABASE_USER",
        "DATABASE_PASSWORD",
    ] {
        command.env_remove(key);
    }
    command
        .current_dir(workdir)
        .env("DATABASE_DRIVER", "libsql")
        .env("DATABASE_NAME", db)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("run ordersheet")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "expected success; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8")
}

fn seeded_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("shop.db");
    stdout(&run_ordersheet(
        &db,
        &["query", "CREATE TABLE stock (sku TEXT PRIMARY KEY, qty INTEGER)"],
    ));
    stdout(&run_ordersheet(
        &db,
        &["query", "INSERT INTO stock VALUES ('A-1', 4), ('B-2', 0)"],
    ));
    (dir, db)
}

#[test]
fn query_select_prints_json_lines() {
    let (_dir, db) = seeded_db();

    let out = stdout(&run_ordersheet(
        &db,
        &["query", "SELECT sku, qty FROM stock ORDER BY sku"],
    ));
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["sku"], "A-1");
    assert_eq!(lines[0]["qty"], 4);
    assert_eq!(lines[1]["qty"], 0);
}

#[test]
fn query_select_keeps_database_column_order() {
    let (_dir, db) = seeded_db();

    let out = stdout(&run_ordersheet(
        &db,
        &["query", "SELECT qty, sku FROM stock WHERE sku = 'A-1'"],
    ));

    assert_eq!(out.trim(), r#"{"qty":4,"sku":"A-1"}"#);
}

#[test]
fn query_write_prints_affected_rows() {
    let (_dir, db) = seeded_db();

    let out = stdout(&run_ordersheet(&db, &["query", "UPDATE stock SET qty = 9"]));
    assert_eq!(out.trim(), "2 rows affected");
}

#[test]
fn truncate_empty_table_reports_emptied() {
    let (_dir, db) = seeded_db();
    stdout(&run_ordersheet(&db, &["query", "CREATE TABLE staging (id INTEGER)"]));

    let out = stdout(&run_ordersheet(&db, &["truncate", "staging"]));
    assert_eq!(out.trim(), "staging: emptied");
}

#[test]
fn truncate_missing_table_fails() {
    let (_dir, db) = seeded_db();

    let output = run_ordersheet(&db, &["truncate", "nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to truncate nope"), "stderr: {stderr}");
}

#[test]
fn yaml_config_overrides_environment() {
    let (dir, db) = seeded_db();
    let other = dir.path().join("other.db");
    let config = dir.path().join("db.yaml");
    std::fs::write(
        &config,
        format!("driver: libsql\ndatabase: {}\n", other.display()),
    )
    .unwrap();

    let config_arg = config.to_string_lossy().into_owned();
    let output = run_ordersheet(&db, &["--config", &config_arg, "query", "SELECT * FROM stock"]);

    assert!(!output.status.success(), "stock only exists in the env database");
}

#[test]
fn report_without_config_table_fails() {
    let (dir, db) = seeded_db();
    let csv = dir.path().join("orders.csv");
    let csv_arg = csv.to_string_lossy().into_owned();

    let output = run_ordersheet(&db, &["report", "--output", &csv_arg]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("order report failed"));
    assert!(!csv.exists());
}

#[test]
fn invalid_driver_flag_fails() {
    let (_dir, db) = seeded_db();

    let output = run_ordersheet(&db, &["--driver", "oracle", "query", "SELECT 1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("oracle"));
}
