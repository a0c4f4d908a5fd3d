use crate::config::Config;
use crate::core::sync::SyncAdapter;
use crate::errors::{AppError, AppResult};
use crate::models::entry::Entry;
use crate::sheets::GoogleSheets;
use crate::ui::messages::success;
use serde_json::Value;
use std::fs;
use std::sync::Arc;

/// Read a JSON array of records from `file`.
pub fn read_entries(file: &str) -> AppResult<Vec<Entry>> {
    let content = fs::read_to_string(file)?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| AppError::validation(format!("{} is not valid JSON: {}", file, e)))?;

    match value {
        Value::Array(items) => items.into_iter().map(Entry::try_from).collect(),
        _ => Err(AppError::validation(format!(
            "{} must contain a JSON array of records",
            file
        ))),
    }
}

pub fn handle(job: &str, file: &str, cfg: &Config) -> AppResult<()> {
    let entries = read_entries(file)?;
    let gateway = Arc::new(GoogleSheets::from_config(cfg)?);
    let adapter = SyncAdapter::new(gateway, cfg.request_timeout());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(adapter.sync(job, &entries))?;

    if report.created {
        success(format!("Created sheet '{}'", report.sheet));
    }
    success(format!(
        "{} row(s) added to sheet: {}",
        report.rows, report.sheet
    ));
    Ok(())
}
