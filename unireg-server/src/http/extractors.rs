//! Custom Axum extractors
//!
//! Rejections become [`ApiError::Validation`] so malformed input is a 400
//! with the usual error body, and nothing downstream runs.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::models::{ObjectId, ValidationError};

/// Extract and validate a 24-hex-character id from path
pub struct ValidObjectId(pub ObjectId);

impl<S> FromRequestParts<S> for ValidObjectId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Missing { fields: vec!["id"] }))?;

        Ok(Self(ObjectId::parse(&id)?))
    }
}

/// JSON body whose decode errors are 400s
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::Validation(ValidationError::Malformed {
                what: "request body",
                detail: rejection.body_text(),
            })
        })?;

        Ok(Self(value))
    }
}

/// Query string whose decode errors are 400s
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(ValidationError::Malformed {
                    what: "query string",
                    detail: rejection.body_text(),
                })
            })?;

        Ok(Self(value))
    }
}
