//! Best-effort relay of created leads to a caller-supplied webhook
//!
//! The relay runs after the lead is stored and the response outcome is
//! decided. Its result is only logged.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::models::Lead;

/// Default upper bound for one relay request
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid webhook url: {0}")]
    InvalidUrl(String),

    #[error("unsupported webhook scheme '{0}'")]
    Scheme(String),

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook answered with status {0}")]
    Status(u16),
}

/// Body POSTed to the webhook
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRelayPayload {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub state: Option<String>,
    pub course_interested: String,
    pub intake_year: String,
    pub consent: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Lead> for LeadRelayPayload {
    fn from(lead: &Lead) -> Self {
        Self {
            full_name: lead.full_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            state: lead.state.clone(),
            course_interested: lead.course_interested.clone(),
            intake_year: lead.intake_year.clone(),
            consent: lead.consent,
            created_at: lead.created_at,
        }
    }
}

/// Accept only absolute http(s) URLs.
pub fn parse_target(raw: &str) -> Result<Url, RelayError> {
    let url = Url::parse(raw.trim()).map_err(|e| RelayError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RelayError::Scheme(other.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for WebhookRelay {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_TIMEOUT)
    }
}

impl WebhookRelay {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// POST the payload and wait for the answer.
    pub async fn relay(&self, url: Url, payload: &LeadRelayPayload) -> Result<u16, RelayError> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }
        Ok(status.as_u16())
    }

    /// Relay in a detached task. Invalid targets are skipped.
    pub fn spawn_relay(&self, raw_url: &str, payload: LeadRelayPayload) -> Option<JoinHandle<()>> {
        let url = match parse_target(raw_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping lead webhook");
                return None;
            }
        };

        let relay = self.clone();
        Some(tokio::spawn(async move {
            let host = url.host_str().unwrap_or_default().to_owned();
            match relay.relay(url, &payload).await {
                Ok(status) => tracing::info!(%host, status, "Lead forwarded to webhook"),
                Err(e) => tracing::warn!(%host, error = %e, "Lead webhook forward failed"),
            }
        }))
    }
}
