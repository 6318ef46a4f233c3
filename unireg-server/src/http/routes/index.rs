//! API root: name, version and endpoint map

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

/// GET /
async fn index() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "University Registration API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "universities": "/api/universities",
            "leads": "/api/leads"
        }
    }))
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(index))
}
