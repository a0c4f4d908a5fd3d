use crate::errors::AppResult;
use crate::models::job::Job;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

pub fn map_row(row: &Row) -> Result<Job> {
    Ok(Job {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}

/// All jobs in insertion order.
pub fn load_jobs(conn: &Connection) -> AppResult<Vec<Job>> {
    let mut stmt = conn.prepare_cached("SELECT id, name, color FROM jobs ORDER BY id ASC")?;

    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn load_job(conn: &Connection, id: i64) -> AppResult<Option<Job>> {
    let mut stmt = conn.prepare_cached("SELECT id, name, color FROM jobs WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

pub fn count_jobs(conn: &Connection) -> AppResult<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
    Ok(n.max(0) as usize)
}

/// Insert a job and return it with its assigned id.
pub fn insert_job(conn: &Connection, name: &str, color: &str) -> AppResult<Job> {
    conn.execute(
        "INSERT INTO jobs (name, color) VALUES (?1, ?2)",
        params![name, color],
    )?;

    Ok(Job {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        color: color.to_string(),
    })
}

/// Delete a job, returning the number of affected rows.
pub fn delete_job(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?)
}
