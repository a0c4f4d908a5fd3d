//! Sync adapter: forwards batches of entries to the per-job sheet.
//!
//! Document metadata is loaded once and cached for the life of the adapter.
//! Lookup-or-create of a sheet is serialized per job name, so two concurrent
//! syncs for the same new job create exactly one sheet. Every remote call is
//! bounded by the configured timeout.

use crate::errors::{AppError, AppResult};
use crate::models::entry::{Entry, batch_header};
use crate::sheets::{DocumentInfo, SheetGateway, SheetInfo};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Outcome of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub sheet: String,
    pub created: bool,
    pub rows: usize,
}

pub struct SyncAdapter {
    gateway: Arc<dyn SheetGateway>,
    timeout: Duration,
    info: RwLock<Option<DocumentInfo>>,
    name_locks: NameLocks,
}

type NameLocks = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

/// Shared handle on the lock of one job name.
///
/// Dropping the last lease removes the name from the map.
struct NameLease<'a> {
    locks: &'a NameLocks,
    name: String,
    lock: Arc<Mutex<()>>,
}

impl Drop for NameLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        // Leases are only cloned under the map lock: map + this one means no other holder.
        if locks
            .get(&self.name)
            .is_some_and(|l| Arc::ptr_eq(l, &self.lock) && Arc::strong_count(l) == 2)
        {
            locks.remove(&self.name);
        }
    }
}

impl SyncAdapter {
    pub fn new(gateway: Arc<dyn SheetGateway>, timeout: Duration) -> Self {
        Self {
            gateway,
            timeout,
            info: RwLock::new(None),
            name_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Append `entries` to the sheet titled `job_name`, creating it if needed.
    pub async fn sync(&self, job_name: &str, entries: &[Entry]) -> AppResult<SyncReport> {
        if job_name.trim().is_empty() {
            return Err(AppError::validation("Invalid data format: jobName is required"));
        }
        if entries.is_empty() {
            return Err(AppError::validation("Invalid data format: data must not be empty"));
        }
        let batch_fields = batch_header(entries)?;

        let lease = self.name_lease(job_name);
        let _guard = lease.lock.lock().await;

        let result = self.resolve_and_append(job_name, &batch_fields, entries).await;

        match &result {
            Ok(report) => info!(
                sheet = %report.sheet,
                rows = report.rows,
                created = report.created,
                "entries synced"
            ),
            Err(e) => {
                warn!(job = job_name, error = %e, "sync failed, dropping cached metadata");
                self.invalidate().await;
            }
        }

        result
    }

    /// Load document metadata now instead of on the first sync.
    pub async fn warm_up(&self) -> AppResult<DocumentInfo> {
        self.document_info(true).await
    }

    /// Forget cached metadata; the next sync reloads it.
    pub async fn invalidate(&self) {
        *self.info.write().await = None;
    }

    /// Currently cached metadata, if any.
    pub async fn cached_info(&self) -> Option<DocumentInfo> {
        self.info.read().await.clone()
    }

    async fn resolve_and_append(
        &self,
        job_name: &str,
        batch_fields: &[String],
        entries: &[Entry],
    ) -> AppResult<SyncReport> {
        let (sheet, created) = self.resolve_sheet(job_name, batch_fields).await?;

        let header = if created {
            batch_fields.to_vec()
        } else {
            let existing = self
                .call("read header row", self.gateway.header_row(&sheet))
                .await?;
            if existing.is_empty() {
                warn!(sheet = %sheet.title, "sheet has no header row, writing one from the batch");
                self.call(
                    "write header row",
                    self.gateway.write_header(&sheet, batch_fields),
                )
                .await?;
                batch_fields.to_vec()
            } else {
                existing
            }
        };

        let dropped: Vec<&String> = batch_fields
            .iter()
            .filter(|f| !header.contains(f))
            .collect();
        if !dropped.is_empty() {
            warn!(sheet = %sheet.title, ?dropped, "fields missing from sheet header are not synced");
        }

        let rows: Vec<Vec<String>> = entries.iter().map(|e| e.row_for(&header)).collect();
        self.call("append rows", self.gateway.append_rows(&sheet, &rows))
            .await?;

        Ok(SyncReport {
            sheet: sheet.title,
            created,
            rows: rows.len(),
        })
    }

    /// Find the sheet bound to `title`, reloading metadata once on a miss
    /// before creating it.
    async fn resolve_sheet(&self, title: &str, header: &[String]) -> AppResult<(SheetInfo, bool)> {
        let info = self.document_info(false).await?;
        if let Some(sheet) = info.sheet_by_title(title) {
            return Ok((sheet.clone(), false));
        }

        let info = self.document_info(true).await?;
        if let Some(sheet) = info.sheet_by_title(title) {
            debug!(title, "sheet appeared after metadata reload");
            return Ok((sheet.clone(), false));
        }

        let sheet = self
            .call("add sheet", self.gateway.add_sheet(title, header))
            .await?;

        if let Some(cached) = self.info.write().await.as_mut() {
            cached.remember(sheet.clone());
        }

        info!(title, sheet_id = sheet.sheet_id, "sheet created");
        Ok((sheet, true))
    }

    async fn document_info(&self, force: bool) -> AppResult<DocumentInfo> {
        if !force && let Some(info) = self.info.read().await.as_ref() {
            return Ok(info.clone());
        }

        let loaded = self
            .call("load metadata", self.gateway.load_info())
            .await?;
        debug!(sheets = loaded.sheets.len(), "spreadsheet metadata loaded");

        *self.info.write().await = Some(loaded.clone());
        Ok(loaded)
    }

    fn name_lease(&self, job_name: &str) -> NameLease<'_> {
        let mut locks = self.name_locks.lock().unwrap_or_else(|p| p.into_inner());
        let lock = Arc::clone(locks.entry(job_name.to_string()).or_default());
        NameLease {
            locks: &self.name_locks,
            name: job_name.to_string(),
            lock,
        }
    }

    /// Bound a gateway call by the timeout and classify its failure.
    async fn call<T>(&self, what: &str, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e @ (AppError::Sync(_) | AppError::Timeout(_)))) => Err(e),
            Ok(Err(e)) => Err(AppError::Sync(format!("{}: {}", what, e))),
            Err(_) => Err(AppError::Timeout(format!(
                "{} did not finish within {:?}",
                what, self.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::MemorySheets;

    fn entry(company: &str, status: &str) -> Entry {
        Entry::new().with("company", company).with("status", status)
    }

    fn adapter(sheets: &Arc<MemorySheets>) -> SyncAdapter {
        SyncAdapter::new(sheets.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn first_sync_creates_sheet_with_header() {
        let sheets = Arc::new(MemorySheets::default());
        let report = adapter(&sheets)
            .sync("Frontend", &[entry("Acme", "applied")])
            .await
            .unwrap();

        assert!(report.created);
        assert_eq!(
            sheets.rows("Frontend").unwrap(),
            vec![vec!["company", "status"], vec!["Acme", "applied"]]
        );
    }

    #[tokio::test]
    async fn second_sync_reuses_sheet_and_cache() {
        let sheets = Arc::new(MemorySheets::default());
        let adapter = adapter(&sheets);
        adapter.sync("Frontend", &[entry("Acme", "applied")]).await.unwrap();
        let calls_after_first = sheets.call_count();

        let report = adapter
            .sync("Frontend", &[entry("Globex", "interview")])
            .await
            .unwrap();

        assert!(!report.created);
        assert_eq!(sheets.add_sheet_count(), 1);
        assert_eq!(sheets.rows("Frontend").unwrap().len(), 3);
        // header read + append, no metadata reload
        assert_eq!(sheets.call_count() - calls_after_first, 2);
    }

    #[tokio::test]
    async fn rows_follow_existing_header_order() {
        let sheets = Arc::new(MemorySheets::default());
        sheets.insert_sheet("Backend", &["status", "company"]).unwrap();

        adapter(&sheets)
            .sync("Backend", &[entry("Acme", "applied")])
            .await
            .unwrap();

        assert_eq!(
            sheets.rows("Backend").unwrap()[1],
            vec!["applied".to_string(), "Acme".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_batch_makes_no_remote_calls() {
        let sheets = Arc::new(MemorySheets::default());
        let err = adapter(&sheets).sync("Frontend", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(sheets.call_count(), 0);
    }

    fn tracked_names(adapter: &SyncAdapter) -> usize {
        adapter.name_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn name_locks_are_released_after_sync() {
        let sheets = Arc::new(MemorySheets::default());
        let adapter = adapter(&sheets);

        for i in 0..50 {
            adapter
                .sync(&format!("Job {}", i), &[entry("Acme", "applied")])
                .await
                .unwrap();
        }
        assert_eq!(tracked_names(&adapter), 0);

        sheets.fail_appends(true);
        adapter
            .sync("Job 0", &[entry("Acme", "applied")])
            .await
            .unwrap_err();
        assert_eq!(tracked_names(&adapter), 0);
    }

    #[tokio::test]
    async fn concurrent_syncs_share_then_release_lock() {
        let sheets = Arc::new(MemorySheets::default().with_latency(Duration::from_millis(10)));
        let adapter = adapter(&sheets);

        let a = [entry("Acme", "applied")];
        let b = [entry("Globex", "applied")];
        let (ra, rb) = tokio::join!(adapter.sync("Frontend", &a), adapter.sync("Frontend", &b));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(sheets.add_sheet_count(), 1);
        assert_eq!(tracked_names(&adapter), 0);
    }

    #[tokio::test]
    async fn failure_invalidates_cache() {
        let sheets = Arc::new(MemorySheets::default());
        let adapter = adapter(&sheets);
        adapter.sync("Frontend", &[entry("Acme", "applied")]).await.unwrap();
        assert!(adapter.cached_info().await.is_some());

        sheets.fail_appends(true);
        let err = adapter
            .sync("Frontend", &[entry("Globex", "applied")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Sync(_)));
        assert!(adapter.cached_info().await.is_none());
    }
}
