//! Lead submission endpoint
//!
//! Writes never fall back: without a live store the request is answered
//! with 503 and nothing is claimed to be saved.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;

use crate::db::DbError;
use crate::fallback::Source;
use crate::http::error::ApiError;
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;
use crate::models::{Lead, LeadSubmission};
use crate::webhook::LeadRelayPayload;

const DUPLICATE_MESSAGE: &str = "Lead with this email and phone already exists";

#[derive(Serialize)]
pub struct LeadResponse {
    pub success: bool,
    pub data: Lead,
    pub message: &'static str,
    pub source: Source,
}

/// POST /api/leads - validate, store, then optionally relay to a webhook
async fn create_lead(
    State(state): State<Arc<AppState>>,
    ValidJson(submission): ValidJson<LeadSubmission>,
) -> Result<(StatusCode, Json<LeadResponse>), ApiError> {
    let new_lead = submission.validate()?;

    let Some(store) = state.connections.acquire().await else {
        tracing::warn!(state = %state.connections.state(), "Lead rejected, database unavailable");
        return Err(ApiError::Unavailable {
            retry_after: state.retry_after(),
        });
    };

    let lead = match store.insert_lead(&new_lead).await {
        Ok(lead) => lead,
        Err(DbError::Conflict { .. }) => {
            return Err(ApiError::Conflict {
                message: DUPLICATE_MESSAGE.to_string(),
            })
        }
        Err(e) if e.is_connectivity() => {
            tracing::warn!(error = %e, "Database unreachable while storing lead");
            state.connections.report_failure(&store).await;
            return Err(ApiError::Unavailable {
                retry_after: state.retry_after(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(lead_id = %lead.id, "Lead created");

    if let Some(url) = submission
        .pipedream_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
    {
        state.webhook.spawn_relay(url, LeadRelayPayload::from(&lead));
    }

    Ok((
        StatusCode::CREATED,
        Json(LeadResponse {
            success: true,
            data: lead,
            message: "Lead submitted successfully",
            source: Source::Database,
        }),
    ))
}

/// Lead routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/leads", post(create_lead))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::testutils::{body_json, post_json, test_app, MemoryStore, ScriptedConnector};

    fn submission() -> serde_json::Value {
        json!({
            "fullName": "Asha Verma",
            "email": "  Asha.Verma@Example.com ",
            "phone": "9876543210",
            "state": "Punjab",
            "courseInterested": "MBA",
            "intakeYear": 2025,
            "consent": true
        })
    }

    #[tokio::test]
    async fn valid_lead_is_created() {
        let store = MemoryStore::seeded();
        let (app, _) = test_app(ScriptedConnector::always_ok(store.clone()));

        let response = app.oneshot(post_json("/api/leads", &submission())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Lead submitted successfully");
        assert_eq!(body["source"], "database");
        assert_eq!(body["data"]["email"], "asha.verma@example.com");
        assert_eq!(body["data"]["intakeYear"], "2025");
        assert_eq!(body["data"]["id"].as_str().unwrap().len(), 24);
        assert_eq!(store.leads().len(), 1);
    }

    #[tokio::test]
    async fn numeric_phone_is_accepted() {
        let store = MemoryStore::seeded();
        let (app, _) = test_app(ScriptedConnector::always_ok(store.clone()));
        let mut body = submission();
        body["phone"] = json!(9876543210u64);

        let response = app.oneshot(post_json("/api/leads", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["data"]["phone"], "9876543210");
        assert_eq!(store.leads()[0].phone, "9876543210");
    }

    #[tokio::test]
    async fn checkbox_style_consent_is_accepted() {
        let (app, _) = test_app(ScriptedConnector::always_ok(MemoryStore::seeded()));

        let mut on = submission();
        on["consent"] = json!("on");
        let response = app.clone().oneshot(post_json("/api/leads", &on)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["data"]["consent"], true);

        let mut zero = submission();
        zero["email"] = json!("other@example.com");
        zero["consent"] = json!(0);
        let response = app.oneshot(post_json("/api/leads", &zero)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["data"]["consent"], false);
    }

    #[tokio::test]
    async fn missing_fields_are_listed() {
        let connector = ScriptedConnector::always_ok(MemoryStore::seeded());
        let calls = connector.calls();
        let (app, _) = test_app(connector);

        let response = app
            .oneshot(post_json("/api/leads", &json!({ "fullName": "Asha" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "Missing required fields: email, phone, courseInterested, intakeYear"
        );
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn bad_phone_is_400() {
        let (app, _) = test_app(ScriptedConnector::always_ok(MemoryStore::seeded()));
        let mut body = submission();
        body["phone"] = json!("98765-4321");

        let response = app.oneshot(post_json("/api/leads", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bad_email_is_400() {
        let (app, _) = test_app(ScriptedConnector::always_ok(MemoryStore::seeded()));
        let mut body = submission();
        body["email"] = json!("asha@example");

        let response = app.oneshot(post_json("/api/leads", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (app, _) = test_app(ScriptedConnector::always_ok(MemoryStore::seeded()));
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/leads")
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{\"fullName\": "))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn duplicate_email_and_phone_is_409() {
        let store = MemoryStore::seeded();
        let (app, _) = test_app(ScriptedConnector::always_ok(store.clone()));

        let first = app
            .clone()
            .oneshot(post_json("/api/leads", &submission()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        // Same identity after normalization
        let mut again = submission();
        again["email"] = json!("asha.verma@EXAMPLE.com");
        let second = app.oneshot(post_json("/api/leads", &again)).await.unwrap();

        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body = body_json(second).await;
        assert_eq!(body["error"], "Lead with this email and phone already exists");
        assert_eq!(store.leads().len(), 1);
    }

    #[tokio::test]
    async fn unavailable_database_is_503_not_fake_success() {
        let (app, _) = test_app(ScriptedConnector::always_fail());

        let response = app.oneshot(post_json("/api/leads", &submission())).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["source"], "fallback");
    }

    #[tokio::test]
    async fn store_dropping_mid_insert_is_503_and_resets_handle() {
        let store = MemoryStore::seeded();
        let (app, connections) = test_app(ScriptedConnector::always_ok(store.clone()));
        connections.acquire().await.unwrap();
        store.set_offline(true);

        let response = app.oneshot(post_json("/api/leads", &submission())).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(connections.handle().await.is_none());
    }
}
