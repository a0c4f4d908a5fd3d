//! HTTP surface of the tracker.
//!
//! - `GET /jobs`: list jobs
//! - `POST /jobs`: create a job from `{name, color}`
//! - `DELETE /jobs/:id`: delete a job
//! - `POST /add-job-entry`: sync `{jobName, data: [...]}` to the job's sheet
//! - `GET /health`: liveness probe
//!
//! Every failure is rendered as `{"error": message}` by
//! [`AppError`](crate::errors::AppError)'s `IntoResponse` impl.

mod error;
mod handlers;

pub use handlers::SyncRequest;

use crate::core::registry::JobRegistry;
use crate::core::sync::SyncAdapter;
use axum::Router;
use axum::routing::{delete, get, post};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub sync: Arc<SyncAdapter>,
}

impl AppState {
    pub fn new(registry: JobRegistry, sync: SyncAdapter) -> Self {
        Self {
            registry: Arc::new(registry),
            sync: Arc::new(sync),
        }
    }
}

/// Build the axum [`Router`] (also used directly by tests via `tower::ServiceExt`).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/jobs", get(handlers::list_jobs).post(handlers::create_job))
        .route("/jobs/:id", delete(handlers::delete_job))
        .route("/add-job-entry", post(handlers::add_job_entry))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API with graceful shutdown triggered by the given future.
pub async fn serve(
    state: AppState,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "job tracker listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
