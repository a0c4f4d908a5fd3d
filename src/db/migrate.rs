use rusqlite::{Connection, Error, OptionalExtension, Result};
use tracing::{info, warn};

const MIGRATION_JOBS_NOCASE: &str = "20250301_0002_jobs_name_nocase";

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Return the `CREATE TABLE` statement of `jobs`, if the table exists.
fn jobs_table_sql(conn: &Connection) -> Result<Option<String>> {
    let mut stmt =
        conn.prepare("SELECT sql FROM sqlite_master WHERE type='table' AND name='jobs'")?;
    stmt.query_row([], |row| row.get(0)).optional()
}

fn migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Create the `jobs` table with the current schema.
///
/// The NOCASE unique index backs up the registry's case-insensitive
/// duplicate check.
fn create_jobs_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL UNIQUE COLLATE NOCASE,
            color TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Count names that collide once case is ignored.
fn case_insensitive_collisions(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM (
             SELECT lower(name) FROM jobs GROUP BY lower(name) HAVING COUNT(*) > 1
         )",
        [],
        |row| row.get(0),
    )
}

/// Rebuild a legacy `jobs` table (case-sensitive UNIQUE) with NOCASE collation.
fn migrate_jobs_name_nocase(conn: &Connection) -> Result<()> {
    if migration_applied(conn, MIGRATION_JOBS_NOCASE)? {
        return Ok(());
    }

    if case_insensitive_collisions(conn)? > 0 {
        warn!(
            "legacy jobs table holds names differing only by case; \
             keeping the old schema until they are removed"
        );
        return Ok(());
    }

    warn!("rebuilding jobs table with case-insensitive names");

    conn.execute_batch(
        r#"
        BEGIN;

        ALTER TABLE jobs RENAME TO jobs_old;

        CREATE TABLE jobs (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL UNIQUE COLLATE NOCASE,
            color TEXT NOT NULL
        );

        INSERT INTO jobs (id, name, color)
        SELECT id, name, color FROM jobs_old;

        DROP TABLE jobs_old;

        COMMIT;
        "#,
    )
    .map_err(|e| {
        let _ = conn.execute_batch("ROLLBACK;");
        Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            Some(format!("Failed to rebuild 'jobs' table: {}", e)),
        )
    })?;

    mark_applied(
        conn,
        MIGRATION_JOBS_NOCASE,
        "Rebuilt jobs table with NOCASE unique names",
    )?;

    info!(
        migration = MIGRATION_JOBS_NOCASE,
        "migration applied, job names are now unique ignoring case"
    );

    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    // 1) Ensure log table
    ensure_log_table(conn)?;

    // 2) Create or upgrade the jobs table
    match jobs_table_sql(conn)? {
        None => {
            create_jobs_table(conn)?;
            mark_applied(conn, MIGRATION_JOBS_NOCASE, "Created jobs table")?;
        }
        Some(sql) if sql.to_uppercase().contains("COLLATE NOCASE") => {}
        Some(_) => migrate_jobs_name_nocase(conn)?,
    }

    Ok(())
}
