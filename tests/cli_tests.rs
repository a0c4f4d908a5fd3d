use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

mod common;
use common::{init_db, rjt, setup_test_db};

#[test]
fn test_init_creates_database() {
    let db_path = setup_test_db("cli_init");
    init_db(&db_path);
    assert!(fs::metadata(&db_path).is_ok());
}

#[test]
fn test_jobs_add_and_list() {
    let db_path = setup_test_db("cli_add_list");
    init_db(&db_path);

    rjt()
        .args(["--db", &db_path, "jobs", "add", "Backend", "#00ff00"])
        .assert()
        .success()
        .stdout(contains("Backend"));

    rjt()
        .args(["--db", &db_path, "jobs", "list"])
        .assert()
        .success()
        .stdout(contains("Backend").and(contains("#00ff00")))
        .stdout(contains("1 / 10 jobs"));

    rjt()
        .args(["--db", &db_path, "jobs", "list", "--json"])
        .assert()
        .success()
        .stdout(contains("\"name\": \"Backend\""));
}

#[test]
fn test_jobs_add_duplicate_fails() {
    let db_path = setup_test_db("cli_duplicate");
    init_db(&db_path);

    rjt()
        .args(["--db", &db_path, "jobs", "add", "Backend", "#00ff00"])
        .assert()
        .success();

    rjt()
        .args(["--db", &db_path, "jobs", "add", "BACKEND", "#ff0000"])
        .assert()
        .failure()
        .stderr(contains("A job with this name already exists"));
}

#[test]
fn test_jobs_del_with_yes() {
    let db_path = setup_test_db("cli_del");
    init_db(&db_path);

    rjt()
        .args(["--db", &db_path, "jobs", "add", "Backend", "#00ff00"])
        .assert()
        .success();

    rjt()
        .args(["--db", &db_path, "jobs", "del", "1", "--yes"])
        .assert()
        .success()
        .stdout(contains("has been deleted"));

    rjt()
        .args(["--db", &db_path, "jobs", "del", "1", "--yes"])
        .assert()
        .failure()
        .stderr(contains("Job not found"));
}

#[test]
fn test_jobs_del_cancelled() {
    let db_path = setup_test_db("cli_del_cancel");
    init_db(&db_path);

    rjt()
        .args(["--db", &db_path, "jobs", "add", "Backend", "#00ff00"])
        .assert()
        .success();

    rjt()
        .args(["--db", &db_path, "jobs", "del", "1"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Operation cancelled"));

    rjt()
        .args(["--db", &db_path, "jobs", "list"])
        .assert()
        .success()
        .stdout(contains("Backend"));
}

#[test]
fn test_log_records_operations() {
    let db_path = setup_test_db("cli_log");
    init_db(&db_path);

    rjt()
        .args(["--db", &db_path, "jobs", "add", "Backend", "#00ff00"])
        .assert()
        .success();

    rjt()
        .args(["--db", &db_path, "log"])
        .assert()
        .success()
        .stdout(contains("migration_applied"))
        .stdout(contains("Job #1 created"));
}

#[test]
fn test_sync_rejects_non_array_file() {
    let db_path = setup_test_db("cli_sync_bad");
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("entries.json");
    fs::write(&file, r#"{"company": "Acme"}"#).unwrap();

    rjt()
        .args([
            "--db",
            &db_path,
            "sync",
            "Frontend",
            file.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("JSON array"));
}

#[test]
fn test_legacy_upgrade_keeps_json_listing_clean() {
    let db_path = setup_test_db("cli_legacy_json");
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            color TEXT NOT NULL
        );
        INSERT INTO jobs (name, color) VALUES ('Backend', '#00ff00');",
    )
    .unwrap();
    drop(conn);

    let output = rjt()
        .args(["--db", &db_path, "jobs", "list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let jobs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(jobs[0]["name"], "Backend");
}
