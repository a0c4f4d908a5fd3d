use crate::api::{self, AppState};
use crate::config::Config;
use crate::core::registry::JobRegistry;
use crate::core::sync::SyncAdapter;
use crate::errors::AppResult;
use crate::sheets::GoogleSheets;
use std::sync::Arc;
use tracing::{info, warn};

pub fn handle(port: Option<u16>, cfg: &Config) -> AppResult<()> {
    let mut cfg = cfg.clone();
    if let Some(p) = port {
        cfg.set_port(p);
    }

    let registry = JobRegistry::open(&cfg)?;
    let gateway = Arc::new(GoogleSheets::from_config(&cfg)?);
    let adapter = SyncAdapter::new(gateway, cfg.request_timeout());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        // Metadata is loaded eagerly; a failure here only delays it to the first sync.
        match adapter.warm_up().await {
            Ok(doc) => info!(title = %doc.title, sheets = doc.sheets.len(), "spreadsheet ready"),
            Err(e) => warn!(error = %e, "could not load spreadsheet metadata at startup"),
        }

        info!(
            database = %cfg.database,
            max_jobs = cfg.max_jobs,
            "starting rjobtracker"
        );

        let state = AppState::new(registry, adapter);
        api::serve(state, &cfg.listen_addr, shutdown_signal()).await
    })?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("could not install Ctrl-C handler; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
