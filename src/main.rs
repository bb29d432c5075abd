use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devfest_backend::{config::Config, store, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DevFest Event Backend");
    tracing::info!("Storage backend: {}", config.storage.as_str());
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.migrate_secret.is_none() {
        tracing::warn!(
            "No migration secret configured (DEVFEST_MIGRATE_SECRET). /api/migrate is disabled."
        );
    }

    // Initialize the selected persistence backend
    let store = store::from_config(&config).await?;

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = devfest_backend::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
