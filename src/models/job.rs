use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A named, colored category that entries are tracked under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub color: String,
}

/// Input for `JobRegistry::create`. Missing JSON fields deserialize as empty
/// strings so they fail validation instead of the body parser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewJob {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl NewJob {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// Trim both fields and reject blanks.
    pub fn validated(&self) -> AppResult<NewJob> {
        let name = self.name.trim();
        let color = self.color.trim();

        if name.is_empty() || color.is_empty() {
            return Err(AppError::validation("Job name and color are required"));
        }

        Ok(NewJob::new(name, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        assert!(NewJob::new("", "#fff").validated().is_err());
        assert!(NewJob::new("Backend", "   ").validated().is_err());
    }

    #[test]
    fn fields_are_trimmed() {
        let job = NewJob::new("  Backend ", " #00ff00").validated().unwrap();
        assert_eq!(job.name, "Backend");
        assert_eq!(job.color, "#00ff00");
    }

    #[test]
    fn missing_json_fields_become_empty() {
        let job: NewJob = serde_json::from_str(r#"{"name":"Backend"}"#).unwrap();
        assert_eq!(job.color, "");
    }
}
