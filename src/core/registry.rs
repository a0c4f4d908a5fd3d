//! Job registry: constrained CRUD over job categories.
//!
//! Two business invariants are enforced here rather than in the store:
//! at most `max_jobs` jobs exist, and no two names are equal ignoring case.
//! The whole check-and-insert of `create` runs under the registry mutex and
//! inside a single `BEGIN IMMEDIATE` transaction, so concurrent creates can
//! never both pass the checks.

use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{count_jobs, delete_job, insert_job, load_job, load_jobs};
use crate::errors::{AppError, AppResult};
use crate::models::job::{Job, NewJob};
use rusqlite::{ErrorCode, TransactionBehavior};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

pub struct JobRegistry {
    pool: Mutex<DbPool>,
    max_jobs: usize,
}

impl JobRegistry {
    /// Wrap an open connection, running pending migrations first.
    pub fn new(pool: DbPool, max_jobs: usize) -> AppResult<Self> {
        init_db(&pool.conn)?;
        Ok(Self {
            pool: Mutex::new(pool),
            max_jobs,
        })
    }

    /// Open the database configured in `cfg`.
    pub fn open(cfg: &Config) -> AppResult<Self> {
        let pool = DbPool::new(&cfg.database)?;
        Self::new(pool, cfg.max_jobs)
    }

    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, DbPool>> {
        self.pool
            .lock()
            .map_err(|_| AppError::Other("job registry lock poisoned".to_string()))
    }

    /// All jobs, ascending by id.
    pub fn list(&self) -> AppResult<Vec<Job>> {
        let guard = self.lock()?;
        load_jobs(&guard.conn)
    }

    pub fn get(&self, id: i64) -> AppResult<Job> {
        let guard = self.lock()?;
        load_job(&guard.conn, id)?.ok_or(AppError::NotFound(id))
    }

    /// Validate, check limit and uniqueness, then insert.
    pub fn create(&self, new_job: &NewJob) -> AppResult<Job> {
        let new_job = new_job.validated()?;

        let mut guard = self.lock()?;
        let tx = guard
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let count = count_jobs(&tx)?;
        if count >= self.max_jobs {
            debug!(count, max = self.max_jobs, "job limit reached");
            return Err(AppError::LimitExceeded { max: self.max_jobs });
        }

        let wanted = new_job.name.to_lowercase();
        if load_jobs(&tx)?
            .iter()
            .any(|j| j.name.to_lowercase() == wanted)
        {
            return Err(AppError::DuplicateName);
        }

        let job = insert_job(&tx, &new_job.name, &new_job.color).map_err(unique_to_duplicate)?;

        ttlog(
            &tx,
            "add",
            &job.name,
            &format!("Job #{} created with color {}", job.id, job.color),
        )?;

        tx.commit()?;

        info!(id = job.id, name = %job.name, "job created");
        Ok(job)
    }

    /// Remove a job. Entries already synced to the spreadsheet are untouched.
    pub fn delete(&self, id: i64) -> AppResult<()> {
        let mut guard = self.lock()?;
        let tx = guard
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = load_job(&tx, id)?;

        if delete_job(&tx, id)? == 0 {
            return Err(AppError::NotFound(id));
        }

        let name = existing.map(|j| j.name).unwrap_or_default();
        ttlog(&tx, "del", &name, &format!("Job #{} deleted", id))?;

        tx.commit()?;

        info!(id, name = %name, "job deleted");
        Ok(())
    }
}

/// The NOCASE unique index is the backstop for the duplicate check.
fn unique_to_duplicate(err: AppError) -> AppError {
    match err {
        AppError::Db(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            AppError::DuplicateName
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn registry(max: usize) -> JobRegistry {
        JobRegistry::new(DbPool::in_memory().unwrap(), max).unwrap()
    }

    #[test]
    fn created_job_is_listed() {
        let reg = registry(10);
        let job = reg.create(&NewJob::new("Backend", "#00ff00")).unwrap();
        assert_eq!(job.id, 1);
        assert_eq!(reg.list().unwrap(), vec![job]);
    }

    #[test]
    fn duplicate_name_differs_only_by_case() {
        let reg = registry(10);
        reg.create(&NewJob::new("Backend", "#00ff00")).unwrap();
        let err = reg.create(&NewJob::new("backend", "#ff0000")).unwrap_err();
        assert!(matches!(err, AppError::DuplicateName));
        assert_eq!(reg.list().unwrap().len(), 1);
    }

    #[test]
    fn unicode_names_compare_case_insensitively() {
        let reg = registry(10);
        reg.create(&NewJob::new("Ärzte", "#123456")).unwrap();
        let err = reg.create(&NewJob::new("ärzte", "#654321")).unwrap_err();
        assert!(matches!(err, AppError::DuplicateName));
    }

    #[test]
    fn limit_is_enforced() {
        let reg = registry(3);
        for i in 0..3 {
            reg.create(&NewJob::new(format!("job-{i}"), "#000")).unwrap();
        }
        let err = reg.create(&NewJob::new("one-too-many", "#000")).unwrap_err();
        assert!(matches!(err, AppError::LimitExceeded { max: 3 }));
        assert_eq!(reg.list().unwrap().len(), 3);
    }

    #[test]
    fn limit_is_checked_before_duplicates() {
        let reg = registry(1);
        reg.create(&NewJob::new("Backend", "#000")).unwrap();
        let err = reg.create(&NewJob::new("backend", "#000")).unwrap_err();
        assert!(matches!(err, AppError::LimitExceeded { .. }));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let reg = registry(10);
        assert!(matches!(reg.delete(42), Err(AppError::NotFound(42))));
    }

    #[test]
    fn delete_writes_audit_row() {
        let reg = registry(10);
        let job = reg.create(&NewJob::new("Backend", "#00ff00")).unwrap();
        reg.delete(job.id).unwrap();
        assert!(reg.list().unwrap().is_empty());

        let guard = reg.lock().unwrap();
        let ops: Vec<String> = crate::db::log::load_log(&guard.conn)
            .unwrap()
            .into_iter()
            .map(|r| r.operation)
            .collect();
        assert!(ops.contains(&"add".to_string()));
        assert!(ops.contains(&"del".to_string()));
    }

    #[test]
    fn concurrent_creates_never_exceed_limit() {
        let reg = Arc::new(registry(10));
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || reg.create(&NewJob::new(format!("job-{i}"), "#000")))
            })
            .collect();

        let ok = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(ok, 10);
        assert_eq!(reg.list().unwrap().len(), 10);
    }

    #[test]
    fn concurrent_same_name_creates_once() {
        let reg = Arc::new(registry(10));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = Arc::clone(&reg);
                let name = if i % 2 == 0 { "Backend" } else { "BACKEND" };
                thread::spawn(move || reg.create(&NewJob::new(name, "#000")))
            })
            .collect();

        let ok = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(ok, 1);
    }
}
