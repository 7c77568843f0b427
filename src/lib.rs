pub mod assets;
pub mod catalog;
pub mod config;
pub mod core_state; // Shared state handed to every request
pub mod credentials;
pub mod crypto;
pub mod db;
pub mod models;
pub mod recommend;
pub mod session; // Page controller
pub mod web;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::core_state::{CoreState, StartupError};

/// Initialize logging from `RUST_LOG`, falling back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load configuration and artifacts, then serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    tracing::info!("MedRec starting v{}", config::APP_VERSION);

    let config = config::AppConfig::from_env();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        db = %config.db_path.display(),
        "Configuration resolved"
    );

    let core = Arc::new(CoreState::from_config(&config)?);
    tracing::info!(
        medicines = core.similarity.len(),
        users = core.credentials.user_count().unwrap_or_default(),
        "Core state ready"
    );

    let mut server = web::start_server(core, config.bind).await?;
    tracing::info!("Open http://{} in a browser", server.addr);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.wait().await;

    tracing::info!("MedRec stopped");
    Ok(())
}
