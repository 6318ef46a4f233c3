//! Health check endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::connection::ConnectionState;
use crate::http::server::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
    pub env: String,
    /// Connection state as last observed; the check never connects
    pub database: ConnectionState,
}

/// GET /api/health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Server is running",
        timestamp: Utc::now().to_rfc3339(),
        env: state.env.to_string(),
        database: state.connections.state(),
    })
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{MemoryStore, ScriptedConnector};
    use crate::{AppEnv, ConnectionManager, RetryPolicy};

    #[tokio::test]
    async fn health_reports_without_connecting() {
        let connector = ScriptedConnector::always_ok(MemoryStore::seeded());
        let calls = connector.calls();
        let connections = Arc::new(ConnectionManager::new(connector, RetryPolicy::default()));
        let state = Arc::new(AppState::new(connections, AppEnv::new("production")));

        let Json(body) = health(State(Arc::clone(&state))).await;
        assert!(body.success);
        assert_eq!(body.message, "Server is running");
        assert_eq!(body.env, "production");
        assert_eq!(body.database, ConnectionState::Disconnected);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn repeated_checks_leave_state_untouched() {
        use axum::http::StatusCode;
        use tower::ServiceExt;

        use crate::testutils::{body_json, get, test_app};

        let (app, connections) = test_app(ScriptedConnector::always_fail());
        for _ in 0..3 {
            let response = app.clone().oneshot(get("/api/health")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["database"], "disconnected");
        }
        assert_eq!(connections.state(), ConnectionState::Disconnected);
    }
}
