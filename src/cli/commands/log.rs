use crate::config::Config;
use crate::db::log::load_log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{color_for_operation, info};

pub fn handle(cfg: &Config) -> AppResult<()> {
    let pool = DbPool::new(&cfg.database)?;
    let entries = load_log(&pool.conn)?;

    if entries.is_empty() {
        info("Internal log is empty.");
        return Ok(());
    }

    let id_w = entries
        .iter()
        .map(|e| e.id.to_string().len())
        .max()
        .unwrap_or(1);
    let op_w = entries
        .iter()
        .map(|e| e.operation.len())
        .max()
        .unwrap_or(10)
        .min(24);

    println!("📜 Internal log:\n");

    for e in entries {
        let date = chrono::DateTime::parse_from_rfc3339(&e.date)
            .map(|dt| dt.format("%FT%T%:z").to_string())
            .unwrap_or(e.date);

        let padding = " ".repeat(op_w.saturating_sub(e.operation.len()));
        let target = if e.target.is_empty() {
            String::new()
        } else {
            format!(" ({})", e.target)
        };

        println!(
            "{:>id_w$}: {} | {}{}{} => {}",
            e.id,
            date,
            color_for_operation(&e.operation).paint(e.operation.as_str()),
            padding,
            target,
            e.message,
            id_w = id_w
        );
    }

    Ok(())
}
