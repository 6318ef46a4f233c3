//! Route handlers organized by resource

pub mod index;
pub mod health;
pub mod universities;
pub mod leads;

use axum::extract::OriginalUri;
use axum::http::Method;

use crate::http::error::ApiError;

/// Fallback for unmatched routes
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::RouteNotFound {
        method: method.to_string(),
        path: uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str())
            .to_owned(),
    }
}
