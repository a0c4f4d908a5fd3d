use super::AppState;
use crate::core::registry::JobRegistry;
use crate::errors::{AppError, AppResult};
use crate::models::entry::Entry;
use crate::models::job::{Job, NewJob};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Body of `POST /add-job-entry`.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(rename = "jobName", default)]
    pub job_name: String,
    #[serde(default)]
    pub data: Value,
}

impl SyncRequest {
    fn into_entries(self) -> AppResult<(String, Vec<Entry>)> {
        let items = match self.data {
            Value::Array(items) if !items.is_empty() => items,
            _ => return Err(AppError::validation("Invalid data format")),
        };
        if self.job_name.trim().is_empty() {
            return Err(AppError::validation("Invalid data format"));
        }

        let entries = items
            .into_iter()
            .map(Entry::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((self.job_name, entries))
    }
}

/// Run a blocking registry call off the async executor.
async fn with_registry<T, F>(registry: &Arc<JobRegistry>, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&JobRegistry) -> AppResult<T> + Send + 'static,
{
    let registry = Arc::clone(registry);
    tokio::task::spawn_blocking(move || f(&registry))
        .await
        .map_err(|e| AppError::Other(format!("registry task failed: {}", e)))?
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn list_jobs(State(state): State<AppState>) -> AppResult<Json<Vec<Job>>> {
    let jobs = with_registry(&state.registry, |r| r.list()).await?;
    Ok(Json(jobs))
}

pub(crate) async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Job>)> {
    let Json(new_job) = payload?;
    let job = with_registry(&state.registry, move |r| r.create(&new_job)).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub(crate) async fn delete_job(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = id?;
    with_registry(&state.registry, move |r| r.delete(id)).await?;
    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

pub(crate) async fn add_job_entry(
    State(state): State<AppState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(request) = payload?;
    let (job_name, entries) = request.into_entries()?;

    state.sync.sync(&job_name, &entries).await?;

    Ok(Json(json!({
        "message": format!("Data added to sheet: {}", job_name)
    })))
}
