#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use rjobtracker::api::{self, AppState};
use rjobtracker::core::registry::JobRegistry;
use rjobtracker::core::sync::SyncAdapter;
use rjobtracker::db::pool::DbPool;
use rjobtracker::models::entry::Entry;
use rjobtracker::sheets::MemorySheets;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub fn rjt() -> Command {
    cargo_bin_cmd!("rjobtracker")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rjobtracker.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Initialize a DB through the CLI, in test mode (no config file written)
pub fn init_db(db_path: &str) {
    rjt()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

pub fn memory_registry(max_jobs: usize) -> JobRegistry {
    JobRegistry::new(DbPool::in_memory().expect("open in-memory db"), max_jobs)
        .expect("init registry")
}

pub fn adapter_for(sheets: &Arc<MemorySheets>) -> SyncAdapter {
    SyncAdapter::new(sheets.clone(), Duration::from_secs(5))
}

/// Router over an in-memory registry and an in-memory spreadsheet.
pub fn test_app() -> (axum::Router, Arc<MemorySheets>) {
    let sheets = Arc::new(MemorySheets::default());
    let state = AppState::new(memory_registry(10), adapter_for(&sheets));
    (api::router(state), sheets)
}

pub fn application(company: &str, status: &str) -> Entry {
    Entry::new().with("company", company).with("status", status)
}
