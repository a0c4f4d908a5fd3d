use crate::config::Config;
use crate::config::migrate::{missing_keys, run_config_migration};
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use std::fs;

/// Handle the `config` subcommand
pub fn handle(print_config: bool, check: bool, migrate: bool, cfg: &Config) -> AppResult<()> {
    let path = Config::config_file();

    if print_config {
        println!("📄 Current configuration:\n");
        println!("{}", cfg.to_yaml()?);
        let token = if cfg.access_token.is_some() {
            "set"
        } else {
            "not set"
        };
        println!("# GOOGLE_ACCESS_TOKEN: {}", token);
    }

    if check {
        if !path.exists() {
            warning(format!(
                "No configuration file at {:?}; defaults are in use.",
                path
            ));
        } else {
            let content = fs::read_to_string(&path)?;
            let missing = missing_keys(&content)?;
            if missing.is_empty() {
                success("Configuration file is complete.");
            } else {
                warning(format!(
                    "Missing fields: {} (run `config --migrate`)",
                    missing.join(", ")
                ));
            }
        }
    }

    if migrate {
        run_config_migration(&path)?;
    }

    if !print_config && !check && !migrate {
        info(format!("Configuration file: {}", path.display()));
    }

    Ok(())
}
