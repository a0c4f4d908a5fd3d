//! Configuration file upgrades: detect keys added in newer releases and
//! fill them with their defaults without touching the user's values.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Keys every current configuration file is expected to carry.
const EXPECTED_KEYS: &[&str] = &[
    "database",
    "listen_addr",
    "max_jobs",
    "log_level",
    "spreadsheet_id",
    "sheets_api_base",
    "request_timeout_secs",
];

fn parse_mapping(content: &str) -> AppResult<Mapping> {
    let yaml: Value = serde_yaml::from_str(content)
        .map_err(|e| AppError::Config(format!("failed to parse configuration: {}", e)))?;

    match yaml {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(
            "configuration root must be a mapping".to_string(),
        )),
    }
}

/// Return the expected keys absent from the given YAML document.
pub fn missing_keys(content: &str) -> AppResult<Vec<&'static str>> {
    let map = parse_mapping(content)?;
    Ok(EXPECTED_KEYS
        .iter()
        .copied()
        .filter(|k| !map.contains_key(Value::String((*k).to_string())))
        .collect())
}

/// Insert defaults for every missing key. Returns the keys that were added.
pub fn add_missing_keys(content: &str) -> AppResult<(String, Vec<&'static str>)> {
    let mut map = parse_mapping(content)?;
    let defaults = match serde_yaml::to_value(Config::default()) {
        Ok(Value::Mapping(m)) => m,
        Ok(_) | Err(_) => {
            return Err(AppError::Config(
                "failed to build default configuration".to_string(),
            ));
        }
    };

    let mut added = Vec::new();
    for key in EXPECTED_KEYS {
        let k = Value::String((*key).to_string());
        if !map.contains_key(&k)
            && let Some(v) = defaults.get(&k)
        {
            map.insert(k, v.clone());
            added.push(*key);
        }
    }

    let serialized = serde_yaml::to_string(&Value::Mapping(map))
        .map_err(|e| AppError::Config(format!("failed to serialize configuration: {}", e)))?;

    Ok((serialized, added))
}

/// Upgrade the configuration file in place.
pub fn run_config_migration(path: &Path) -> AppResult<()> {
    if !path.exists() {
        info(format!("No configuration file at {:?}, nothing to migrate.", path));
        return Ok(());
    }

    let content = fs::read_to_string(path)?;
    let (updated, added) = add_missing_keys(&content)?;

    if added.is_empty() {
        info("Configuration is already up to date.");
        return Ok(());
    }

    fs::write(path, updated)?;
    success(format!("Configuration migrated, added: {}", added.join(", ")));
    Ok(())
}
