// File: src/main.rs
// Purpose: Report service entry point

mod cors;
mod extract;
mod handlers;

use anyhow::{Context, Result};
use handlers::{router, AppState};
use reqbind::{Catalogs, Config};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::load_default().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });

    // Environment overrides
    if let Some(bundle) = std::env::var("BUNDLE_ERRORS").ok().and_then(|v| v.parse::<bool>().ok()) {
        config.validation.bundle_errors = bundle;
    }
    if let Some(port) = std::env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
        config.server.port = port;
    }

    let catalogs = Catalogs::standard();
    catalogs
        .for_locale(&config.validation.locale)
        .with_context(|| format!("no error catalog for locale {:?}", config.validation.locale))?;

    info!(
        locale = %config.validation.locale,
        bundle_errors = config.validation.bundle_errors,
        "validation defaults"
    );

    let cors = cors::cors_layer(&config.cors);
    let app = router(AppState::new(catalogs, config.validation.clone())).layer(cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
