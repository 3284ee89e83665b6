//! Muleflow HTTP server entry point.

use std::sync::Arc;

use muleflow_core::config::AppConfig;
use muleflow_server::api::{router, AppState};
use muleflow_server::store::ResultStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    muleflow_core::logging::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        let config = AppConfig::load(&config_path)?;
        tracing::info!(path = %config_path, "configuration loaded");
        config
    } else {
        tracing::info!("no configuration file, using defaults");
        AppConfig::default()
    };

    let mut server = config.server.clone();
    if let Ok(port) = std::env::var("PORT") {
        if let Ok(port) = port.parse() {
            server.port = port;
        }
    }

    let state = AppState {
        store: Arc::new(ResultStore::new()),
        config: Arc::new(config.engine),
    };
    let app = router(state);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "muleflow server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
