mod ai;
mod config;
mod db;
mod errors;
mod extract;
mod metrics;
mod routes;
mod services;
mod storage;

use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let config = config::AppConfig::load()?;

    // 2. Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.rust_log))
        .init();

    tracing::info!("Starting lectern v{}...", env!("CARGO_PKG_VERSION"));

    // 3. Initialize database and run migrations
    let db = db::Db::connect(&config.database).await?;
    db.migrate().await?;
    tracing::info!("Connected to database");

    // 4. Initialize the AI chat client; "mock" key selects the in-process mock
    let chat: Arc<dyn ai::ChatClient> = if config.ai.use_mock() {
        tracing::warn!("AI api_key is 'mock'; using in-process mock chat client");
        Arc::new(ai::MockChatClient)
    } else {
        Arc::new(ai::CloudChatClient::new(config.ai.clone())?)
    };

    // 5. Initialize upload storage and app state
    let store = storage::UploadStore::new(&config.storage.upload_dir);
    let state = services::AppState::new(db.clone(), store, chat);

    // 6. Setup router
    let app = routes::create_router(state, &config);

    // 7. Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => tracing::info!("Received SIGTERM, starting shutdown..."),
    }
}
