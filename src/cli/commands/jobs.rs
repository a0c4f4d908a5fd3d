use crate::cli::parser::JobsAction;
use crate::config::Config;
use crate::core::registry::JobRegistry;
use crate::errors::{AppError, AppResult};
use crate::models::job::NewJob;
use crate::ui::messages::{info, success, warning};

use std::io::{self, Write};

/// Ask a yes/no confirmation from the user
fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

pub fn handle(action: &JobsAction, cfg: &Config) -> AppResult<()> {
    let registry = JobRegistry::open(cfg)?;

    match action {
        JobsAction::List { json } => {
            let jobs = registry.list()?;

            if *json {
                let out = serde_json::to_string_pretty(&jobs)
                    .map_err(|e| AppError::Other(e.to_string()))?;
                println!("{}", out);
                return Ok(());
            }

            if jobs.is_empty() {
                info("No jobs defined yet.");
                return Ok(());
            }

            let name_w = jobs.iter().map(|j| j.name.chars().count()).max().unwrap_or(4);
            println!("{:>4}  {:<name_w$}  COLOR", "ID", "NAME", name_w = name_w);
            for j in &jobs {
                println!("{:>4}  {:<name_w$}  {}", j.id, j.name, j.color, name_w = name_w);
            }
            println!("\n{} / {} jobs", jobs.len(), registry.max_jobs());
        }

        JobsAction::Add { name, color } => {
            let job = registry.create(&NewJob::new(name.as_str(), color.as_str()))?;
            success(format!("Job #{} '{}' created ({})", job.id, job.name, job.color));
        }

        JobsAction::Del { id, yes } => {
            let job = registry.get(*id)?;

            let prompt = format!(
                "Delete job #{} '{}'? Synced entries stay in the spreadsheet.",
                job.id, job.name
            );
            if !*yes && !ask_confirmation(&prompt) {
                info("Operation cancelled.");
                return Ok(());
            }

            registry.delete(*id)?;
            success(format!("Job #{} '{}' has been deleted.", job.id, job.name));
        }
    }

    Ok(())
}
