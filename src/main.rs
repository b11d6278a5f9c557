//! API Key Authentication Service - Main Application Entry Point
//!
//! This is a REST API server that authenticates callers by the API key they
//! present in the `X-Api-Key` header, and that registers its own key in the
//! shared key store on startup if one is not already present.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Key Store**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: opaque API keys resolved through a cache-aside
//!   credential cache and compared by equality
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration and key authentication settings from environment
//! 2. Create key store connection pool (bounded retry)
//! 3. Run database migrations
//! 4. Provision this service's registration (idempotent; fatal on conflict)
//! 5. Build HTTP router with routes and the authentication gate
//! 6. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod repository;
mod services;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    extract::FromRef,
    middleware as axum_middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::repository::PgServiceRepository;
use crate::services::authentication::ApiKeyAuthenticator;
use crate::services::key_cache::KeyCacheService;

/// Shared application state handed to every handler.
///
/// All members are cheap to clone; the settings resolved at startup live
/// inside the authenticator as an immutable value.
#[derive(Clone)]
struct AppState {
    pool: db::DbPool,
    cache: Arc<KeyCacheService>,
    authenticator: ApiKeyAuthenticator,
}

impl FromRef<AppState> for db::DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<KeyCacheService> {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}

impl FromRef<AppState> for ApiKeyAuthenticator {
    fn from_ref(state: &AppState) -> Self {
        state.authenticator.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    let settings = config::KeyAuthSettings::from_env()?;
    tracing::info!(service_name = %settings.service_name, "Configuration loaded");

    // Create key store pool (retries transient connection failures)
    let pool = db::create_pool(&config.keystore_database_url).await?;
    tracing::info!("Key store pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Key store migrations complete");

    // Ensure our own registration exists before accepting any traffic.
    // A conflict here is fatal: the process must not serve requests it
    // cannot authenticate.
    let repository = PgServiceRepository::new(pool.clone());
    services::provisioning::ensure_service_registered(&repository, &settings).await?;

    // Wire the credential cache and the authentication decision
    let cache = Arc::new(KeyCacheService::new(Arc::new(repository)));
    let authenticator = ApiKeyAuthenticator::new(cache.clone(), settings);

    let state = AppState {
        pool,
        cache,
        authenticator,
    };

    // Create authenticated routes (API endpoints)
    let authenticated_routes = Router::new()
        // Roster of registered services, behind the hard gate
        .route("/api/v1/services", get(handlers::services::list_services))
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_key,
        ))
        // Identity echo authenticates per-route via the extractor instead
        .route("/api/v1/identity", get(handlers::services::identity));

    // Combine authenticated routes with public routes
    let app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        // Merge authenticated routes
        .merge(authenticated_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share state with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
