//! Axum server setup
//!
//! Server skeleton with:
//! - CORS restricted to `FRONTEND_URL` when set
//! - Tracing and request-timeout middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C, closing the database handle

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::error::expose_internal_errors;
use super::routes;
use crate::config::{AppEnv, ServerConfig};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::fallback::{FallbackDataset, FallbackResolver};
use crate::webhook::WebhookRelay;

/// JSON bodies larger than this are rejected
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<ConnectionManager>,
    pub resolver: FallbackResolver,
    pub webhook: WebhookRelay,
    pub env: AppEnv,
}

impl AppState {
    pub fn new(connections: Arc<ConnectionManager>, env: AppEnv) -> Self {
        let resolver = FallbackResolver::new(
            Arc::clone(&connections),
            Arc::new(FallbackDataset::builtin()),
        );
        Self {
            connections,
            resolver,
            webhook: WebhookRelay::default(),
            env,
        }
    }

    /// Suggested wait before a client retries a write that hit an outage.
    pub fn retry_after(&self) -> Duration {
        let policy = self.connections.policy();
        match self.connections.state() {
            ConnectionState::Unavailable => policy.cooldown,
            _ => policy.retry_delay,
        }
    }
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Result<Router, ServerError> {
    let cors = match &config.frontend_url {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|_| ServerError::InvalidOrigin(origin.clone()))?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(cors);

    Ok(Router::new()
        .merge(routes::index::router())
        .merge(routes::health::router())
        .merge(routes::universities::router())
        .merge(routes::leads::router())
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::map_response_with_state(
            Arc::clone(&state),
            expose_internal_errors,
        ))
        .layer(layers)
        .with_state(state))
}

/// Run the HTTP server.
///
/// The database is not touched here; the first request that needs it
/// connects through `connections`.
///
/// # Example
///
/// ```ignore
/// let connector = PgConnector::new(&config.database_url);
/// let manager = ConnectionManager::new(connector, config.retry)
///     .with_caller_wait(config.connect_wait());
/// run_server(Arc::new(manager), config).await?;
/// ```
pub async fn run_server(
    connections: Arc<ConnectionManager>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let state = Arc::new(AppState::new(Arc::clone(&connections), config.env.clone()));
    let app = build_router(state, &config)?;

    match &config.frontend_url {
        Some(origin) => tracing::info!(%origin, "CORS: restricted to frontend origin"),
        None => tracing::warn!("CORS: FRONTEND_URL not set - all origins allowed"),
    }

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(env = %config.env, "Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    connections.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid FRONTEND_URL origin: {0}")]
    InvalidOrigin(String),
}
