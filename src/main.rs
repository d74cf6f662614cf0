use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formaggio_web::api::DataService;
use formaggio_web::config::Config;
use formaggio_web::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formaggio_web=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("SITE_CONFIG").unwrap_or_else(|_| "site.toml".to_string());
    let mut config = Config::load(&config_path)?;
    if let Ok(api_base_url) = std::env::var("API_BASE_URL") {
        config = config.with_api_base_url(api_base_url);
    }
    info!("Loaded configuration from {}", config_path);

    // Create the API client shared by every page
    let service = DataService::new(
        &config.api_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    info!("Using content API at {}", service.base_url());

    let state = Arc::new(AppState::new(&config, Arc::new(service)));
    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server starting on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
