// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact gateway.
//!
//! The contact pipeline runs its stages strictly in order, each able to
//! short-circuit with a terminal outcome:
//!
//! throttle -> field validation -> spam heuristics -> captcha -> dispatch
//!
//! Spam, captcha-outage, and delivery failures are reported with a
//! 200-shaped body (`ok:false` and a generic message). Validation and
//! captcha rejections get a 400, throttling a 429, and a missing
//! delivery credential a 503.

use crate::antispam::{SpamHeuristics, SpamVerdict};
use crate::captcha::CaptchaVerifier;
use crate::config::Config;
use crate::metrics::{outcome, Metrics};
use crate::notify::{ContactMessage, DispatchOutcome, NotificationDispatcher};
use crate::throttle::{RequestThrottle, ThrottleDecision};
use crate::validator::{SubmissionValidator, ValidationResult};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub throttle: RequestThrottle,
    pub validator: SubmissionValidator,
    pub antispam: SpamHeuristics,
    pub captcha: CaptchaVerifier,
    pub dispatcher: NotificationDispatcher,
    pub metrics: Metrics,
    pub config: Config,
}

/// Contact submission body.
///
/// Every field is optional at the wire level so that missing required
/// fields surface as the pipeline's own 400 rather than a
/// deserialization error.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub hp: Option<String>,
    #[serde(default, rename = "formStart")]
    pub form_start: Option<i64>,
}

/// Contact submission response.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContactResponse {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub time: String,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let metrics_enabled = state.config.metrics.enabled;
    let metrics_path = state.config.metrics.path.clone();

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/health", get(health))
        .route("/api/contact", post(contact));

    if metrics_enabled {
        router = router.route(&metrics_path, get(metrics_text));
    }

    router.with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: "contact-gateway",
        version: env!("CARGO_PKG_VERSION"),
        time: Utc::now().to_rfc3339(),
    })
}

/// Prometheus text exposition endpoint.
pub async fn metrics_text(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            warn!(error = %err, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

/// Contact submission endpoint.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ContactRequest>,
) -> (StatusCode, Json<ContactResponse>) {
    let client_key = client_key(&headers);

    // Throttle first: the increment lands before any network call, so a
    // client disconnect mid-pipeline cannot skew the window.
    if let ThrottleDecision::Denied { retry_after } =
        state.throttle.admit(&client_key, Instant::now()).await
    {
        info!(key = %client_key, retry_after_secs = retry_after.as_secs(), "Submission throttled");
        state.metrics.record(outcome::DENIED);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ContactResponse::error(
                "Too many requests. Please try again later.",
            )),
        );
    }

    if let ValidationResult::Invalid(err) = state.validator.validate(
        req.email.as_deref(),
        req.subject.as_deref(),
        req.message.as_deref(),
        req.phone.as_deref(),
    ) {
        debug!(key = %client_key, error = %err, "Submission rejected by validation");
        state.metrics.record(outcome::INVALID);
        return (
            StatusCode::BAD_REQUEST,
            Json(ContactResponse::error(err.to_string())),
        );
    }

    let now_ms = Utc::now().timestamp_millis();
    if let SpamVerdict::SoftReject(signal) =
        state
            .antispam
            .evaluate(req.hp.as_deref(), req.form_start, now_ms)
    {
        info!(key = %client_key, signal = %signal, "Submission soft-rejected");
        state.metrics.record(outcome::SOFT_REJECTED);
        return (
            StatusCode::OK,
            Json(ContactResponse::error(signal.masked_message())),
        );
    }

    match state.captcha.verify(req.token.as_deref()).await {
        Ok(verdict) if !verdict.valid => {
            info!(key = %client_key, reason = ?verdict.reason, "Captcha rejected");
            state.metrics.record(outcome::CAPTCHA_FAILED);
            return (
                StatusCode::BAD_REQUEST,
                Json(ContactResponse::error("Captcha validation failed.")),
            );
        }
        Ok(_) => {}
        Err(err) => {
            warn!(key = %client_key, error = %err, "Captcha verification unavailable");
            state.metrics.record(outcome::CAPTCHA_UNAVAILABLE);
            return (
                StatusCode::OK,
                Json(ContactResponse::error("Captcha verification error.")),
            );
        }
    }

    let (email, subject, message) = match (
        req.email.as_deref(),
        req.subject.as_deref(),
        req.message.as_deref(),
    ) {
        (Some(email), Some(subject), Some(message)) => (email, subject, message),
        _ => {
            state.metrics.record(outcome::INVALID);
            return (
                StatusCode::BAD_REQUEST,
                Json(ContactResponse::error("Missing required fields.")),
            );
        }
    };

    let contact_message = ContactMessage {
        email,
        company: req.company.as_deref().filter(|c| !c.is_empty()),
        phone: req.phone.as_deref().filter(|p| !p.is_empty()),
        subject,
        message,
    };

    match state.dispatcher.dispatch(&contact_message).await {
        DispatchOutcome::Sent => {
            info!(key = %client_key, "Submission delivered");
            state.metrics.record(outcome::SENT);
            (StatusCode::OK, Json(ContactResponse::ok()))
        }
        DispatchOutcome::DeliveryFailed(failure) => {
            state.metrics.record(outcome::DELIVERY_FAILED);
            (
                StatusCode::OK,
                Json(ContactResponse::error(failure.masked_message())),
            )
        }
        DispatchOutcome::NotConfigured => {
            state.metrics.record(outcome::NOT_CONFIGURED);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ContactResponse::error("Email service not configured.")),
            )
        }
    }
}

/// Client key for throttling: first forwarded-for entry, "unknown" when
/// the header is absent or empty.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_key_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn test_client_key_defaults_to_unknown() {
        assert_eq!(client_key(&HeaderMap::new()), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_key(&headers), "unknown");
    }

    #[test]
    fn test_response_serialization() {
        let ok = serde_json::to_value(ContactResponse::ok()).unwrap();
        assert_eq!(ok, serde_json::json!({ "ok": true }));

        let err = serde_json::to_value(ContactResponse::error("Invalid email.")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({ "ok": false, "error": "Invalid email." })
        );
    }
}
