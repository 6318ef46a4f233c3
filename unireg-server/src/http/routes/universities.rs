//! University directory endpoints
//!
//! Reads go through the [`FallbackResolver`](crate::fallback::FallbackResolver),
//! so they answer from the static dataset while the database is down.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::fallback::Source;
use crate::http::error::ApiError;
use crate::http::extractors::{ValidObjectId, ValidQuery};
use crate::http::server::AppState;
use crate::models::{
    PageInfo, Pagination, PaginationParams, University, UniversityFilter, UniversitySummary,
};

/// Query string of `GET /api/universities`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListParams {
    fn pagination(&self) -> Pagination {
        Pagination::from(PaginationParams {
            page: self.page,
            limit: self.limit,
        })
    }
}

#[derive(Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<UniversitySummary>,
    pub pagination: PageInfo,
    pub source: Source,
}

#[derive(Serialize)]
pub struct DetailResponse {
    pub success: bool,
    pub data: University,
    pub source: Source,
}

/// GET /api/universities - paginated summaries, optionally filtered
async fn list_universities(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let filter = UniversityFilter::new(params.search.as_deref())?;
    let resolved = state
        .resolver
        .list_universities(&filter, params.pagination())
        .await?;

    Ok(Json(ListResponse {
        success: true,
        pagination: resolved.data.info(),
        data: resolved.data.items,
        source: resolved.source,
    }))
}

/// GET /api/universities/{id} - full profile
async fn get_university(
    State(state): State<Arc<AppState>>,
    ValidObjectId(id): ValidObjectId,
) -> Result<Json<DetailResponse>, ApiError> {
    let resolved = state.resolver.get_university(&id).await?;

    Ok(Json(DetailResponse {
        success: true,
        data: resolved.data,
        source: resolved.source,
    }))
}

/// University routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/universities", get(list_universities))
        .route("/api/universities/{id}", get(get_university))
}
