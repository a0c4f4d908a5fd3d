//! In-memory spreadsheet backend.

use super::{DocumentInfo, SheetGateway, SheetInfo};
use crate::errors::{AppError, AppResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

struct MemorySheet {
    info: SheetInfo,
    /// Row 0 is the header row.
    rows: Vec<Vec<String>>,
}

/// Spreadsheet document kept in a `Mutex<Vec>`.
///
/// Behaves like the remote API for the operations the adapter uses:
/// creating a sheet with an existing title fails. Counts every call and can
/// inject latency or a failing append so tests can observe the adapter.
pub struct MemorySheets {
    title: String,
    sheets: Mutex<Vec<MemorySheet>>,
    next_id: AtomicUsize,
    latency: Duration,
    fail_appends: AtomicBool,
    calls: AtomicUsize,
    add_sheet_calls: AtomicUsize,
    append_calls: AtomicUsize,
}

impl Default for MemorySheets {
    fn default() -> Self {
        Self::new("Job Tracker")
    }
}

impl MemorySheets {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sheets: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            latency: Duration::ZERO,
            fail_appends: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            add_sheet_calls: AtomicUsize::new(0),
            append_calls: AtomicUsize::new(0),
        }
    }

    /// Sleep this long before every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every subsequent append fail (or succeed again).
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Create a sheet directly, as another client of the document would.
    pub fn insert_sheet(&self, title: &str, header: &[&str]) -> AppResult<SheetInfo> {
        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        self.create(title, &header)
    }

    /// Total gateway calls of any kind.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn add_sheet_count(&self) -> usize {
        self.add_sheet_calls.load(Ordering::SeqCst)
    }

    pub fn append_count(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn sheet_titles(&self) -> Vec<String> {
        self.lock()
            .map(|s| s.iter().map(|sh| sh.info.title.clone()).collect())
            .unwrap_or_default()
    }

    /// Every row of the sheet, header first.
    pub fn rows(&self, title: &str) -> Option<Vec<Vec<String>>> {
        self.lock().ok().and_then(|s| {
            s.iter()
                .find(|sh| sh.info.title == title)
                .map(|sh| sh.rows.clone())
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Vec<MemorySheet>>> {
        self.sheets
            .lock()
            .map_err(|_| AppError::Other("memory sheets lock poisoned".to_string()))
    }

    fn create(&self, title: &str, header: &[String]) -> AppResult<SheetInfo> {
        let mut sheets = self.lock()?;
        if sheets.iter().any(|s| s.info.title == title) {
            return Err(AppError::Sync(format!(
                "A sheet with the name \"{}\" already exists",
                title
            )));
        }

        let info = SheetInfo {
            sheet_id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64,
            title: title.to_string(),
        };
        let rows = if header.is_empty() {
            Vec::new()
        } else {
            vec![header.to_vec()]
        };
        sheets.push(MemorySheet {
            info: info.clone(),
            rows,
        });
        Ok(info)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait::async_trait]
impl SheetGateway for MemorySheets {
    async fn load_info(&self) -> AppResult<DocumentInfo> {
        self.enter().await;
        let sheets = self.lock()?;
        Ok(DocumentInfo {
            title: self.title.clone(),
            sheets: sheets.iter().map(|s| s.info.clone()).collect(),
        })
    }

    async fn add_sheet(&self, title: &str, header: &[String]) -> AppResult<SheetInfo> {
        self.enter().await;
        self.add_sheet_calls.fetch_add(1, Ordering::SeqCst);
        self.create(title, header)
    }

    async fn header_row(&self, sheet: &SheetInfo) -> AppResult<Vec<String>> {
        self.enter().await;
        let sheets = self.lock()?;
        let found = sheets
            .iter()
            .find(|s| s.info.sheet_id == sheet.sheet_id)
            .ok_or_else(|| AppError::Sync(format!("sheet \"{}\" not found", sheet.title)))?;
        Ok(found.rows.first().cloned().unwrap_or_default())
    }

    async fn write_header(&self, sheet: &SheetInfo, header: &[String]) -> AppResult<()> {
        self.enter().await;
        let mut sheets = self.lock()?;
        let found = sheets
            .iter_mut()
            .find(|s| s.info.sheet_id == sheet.sheet_id)
            .ok_or_else(|| AppError::Sync(format!("sheet \"{}\" not found", sheet.title)))?;
        match found.rows.first_mut() {
            Some(first) => *first = header.to_vec(),
            None => found.rows.push(header.to_vec()),
        }
        Ok(())
    }

    async fn append_rows(&self, sheet: &SheetInfo, rows: &[Vec<String>]) -> AppResult<()> {
        self.enter().await;
        self.append_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::Sync("append rejected by backend".to_string()));
        }

        let mut sheets = self.lock()?;
        let found = sheets
            .iter_mut()
            .find(|s| s.info.sheet_id == sheet.sheet_id)
            .ok_or_else(|| AppError::Sync(format!("sheet \"{}\" not found", sheet.title)))?;
        found.rows.extend(rows.iter().cloned());
        Ok(())
    }
}
