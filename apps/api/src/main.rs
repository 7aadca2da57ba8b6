mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod jobs;
mod linkedin;
mod models;
mod routes;
mod state;
mod store;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::CredentialVerifier;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::linkedin::{LinkedInApi, LinkedInClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobtrack API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;
    let store = Arc::new(PgStore::new(db));

    let auth = CredentialVerifier::from_config(&config, store.clone(), store.clone())?;
    info!("Authentication mode: {:?}", config.auth_mode);

    let linkedin: Option<Arc<dyn LinkedInApi>> = match &config.linkedin {
        Some(linkedin_config) => {
            info!("LinkedIn integration enabled");
            Some(Arc::new(LinkedInClient::new(linkedin_config.clone())?))
        }
        None => {
            info!("LinkedIn integration disabled (client credentials not set)");
            None
        }
    };

    let cors = cors_layer(&config)?;
    let port = config.port;

    // Build app state
    let state = AppState {
        config,
        jobs: store.clone(),
        users: store,
        auth: Arc::new(auth),
        linkedin,
    };

    // Build router
    let app = build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The browser client sends cookies, so the allowed origin must be explicit.
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("CORS_ORIGIN '{}' is not a valid origin", config.cors_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}
