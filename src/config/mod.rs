use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

pub mod migrate; // use submodule at src/config/migrate.rs

pub const DEFAULT_MAX_JOBS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Bearer token for the sheets API, only ever read from the environment.
    #[serde(skip)]
    pub access_token: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}
fn default_max_jobs() -> usize {
    DEFAULT_MAX_JOBS
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}
fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file().to_string_lossy().to_string())
    }
}

impl Config {
    /// Defaults bound to a specific database path.
    pub fn with_database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            listen_addr: default_listen_addr(),
            max_jobs: default_max_jobs(),
            log_level: default_log_level(),
            spreadsheet_id: String::new(),
            sheets_api_base: default_sheets_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            access_token: None,
        }
    }

    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        match dirs::home_dir() {
            Some(home) if !cfg!(target_os = "windows") => home.join(".rjobtracker"),
            _ => {
                let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(appdata).join("rjobtracker")
            }
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rjobtracker.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rjobtracker.sqlite")
    }

    /// Load configuration from file (or defaults if not found), then apply
    /// environment overrides.
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        let cfg = if path.exists() {
            let content = fs::read_to_string(&path)?;
            Self::from_yaml(&content)?
        } else {
            Config::default()
        };

        Ok(cfg.with_env_overrides())
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("failed to parse configuration: {}", e)))
    }

    /// Apply `PORT`, `GOOGLE_SHEET_ID` and `GOOGLE_ACCESS_TOKEN`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = env::var("PORT")
            && let Ok(port) = port.trim().parse::<u16>()
        {
            self.set_port(port);
        }

        if let Ok(id) = env::var("GOOGLE_SHEET_ID")
            && !id.trim().is_empty()
        {
            self.spreadsheet_id = id.trim().to_string();
        }

        if let Ok(token) = env::var("GOOGLE_ACCESS_TOKEN")
            && !token.trim().is_empty()
        {
            self.access_token = Some(token.trim().to_string());
        }

        self
    }

    /// Keep the host of `listen_addr`, switch its port.
    pub fn set_port(&mut self, port: u16) {
        self.listen_addr = replace_port(&self.listen_addr, port);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::Config(format!("failed to serialize configuration: {}", e)))
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<Config> {
        let dir = Self::config_dir();

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            dir.join("rjobtracker.sqlite")
        };

        let config = Config::with_database(db_path.to_string_lossy().to_string());

        // Write config file
        if !is_test {
            fs::create_dir_all(&dir)?;
            let yaml = config.to_yaml()?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path).map_err(|e| {
                io::Error::new(e.kind(), format!("cannot create {:?}: {}", db_path, e))
            })?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(config)
    }
}

/// Swap the port of a `host:port` address, keeping the host.
fn replace_port(addr: &str, port: u16) -> String {
    match addr.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", addr, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_gets_defaults() {
        let cfg = Config::from_yaml("database: /tmp/jobs.sqlite\n").unwrap();
        assert_eq!(cfg.database, "/tmp/jobs.sqlite");
        assert_eq!(cfg.max_jobs, 10);
        assert_eq!(cfg.listen_addr, "0.0.0.0:5000");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert!(cfg.access_token.is_none());
    }

    #[test]
    fn broken_yaml_is_a_config_error() {
        let err = Config::from_yaml("database: [unterminated").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn token_is_never_serialized() {
        let mut cfg = Config::with_database("x.sqlite");
        cfg.access_token = Some("secret".into());
        let yaml = cfg.to_yaml().unwrap();
        assert!(!yaml.contains("secret"));
    }

    #[test]
    fn port_replacement_keeps_host() {
        assert_eq!(replace_port("127.0.0.1:5000", 8080), "127.0.0.1:8080");
        assert_eq!(replace_port("localhost", 80), "localhost:80");
    }
}
