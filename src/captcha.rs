// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! CAPTCHA token verification.
//!
//! Two backends are supported, selected by which credentials are
//! configured:
//!
//! - **Checkbox**: the token and a shared secret are form-posted to the
//!   siteverify endpoint; the response carries a boolean `success`.
//! - **Risk-score**: the token and site key are submitted as an
//!   assessment; the response carries `tokenProperties.valid` plus a
//!   `riskAnalysis.score` that must clear a configurable minimum.
//!
//! With no backend configured (or no token supplied by the client) the
//! check is skipped and the submission proceeds. A failing network call
//! or unparseable response is reported as `CaptchaError::Unavailable`
//! and must be mapped to a masked, success-shaped response: a provider
//! outage must not close the contact channel.

use crate::config::CaptchaConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Outcome of verifying one token.
#[derive(Debug, Clone)]
pub struct CaptchaVerdict {
    /// Whether the token was accepted
    pub valid: bool,
    /// Risk score, when the backend produces one (0..1, higher is more human)
    pub score: Option<f64>,
    /// Provider-supplied reason for an invalid token
    pub reason: Option<String>,
}

impl CaptchaVerdict {
    fn skipped(reason: &str) -> Self {
        Self {
            valid: true,
            score: None,
            reason: Some(reason.to_string()),
        }
    }
}

/// Verification failure (network or response decoding).
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("verification service unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
}

/// Which verification backend is active.
#[derive(Debug)]
enum Backend {
    Checkbox {
        secret: String,
    },
    RiskScore {
        api_key: String,
        site_key: String,
        project_id: String,
    },
    Disabled,
}

/// CAPTCHA verification client.
pub struct CaptchaVerifier {
    config: CaptchaConfig,
    backend: Backend,
    client: reqwest::Client,
}

impl CaptchaVerifier {
    /// Create a verifier, selecting the backend from the configuration.
    /// The checkbox backend wins when both are configured.
    pub fn new(config: CaptchaConfig, client: reqwest::Client) -> Self {
        let backend = if let Some(secret) = config.secret.clone() {
            Backend::Checkbox { secret }
        } else if let (Some(api_key), Some(site_key), Some(project_id)) = (
            config.api_key.clone(),
            config.site_key.clone(),
            config.project_id.clone(),
        ) {
            Backend::RiskScore {
                api_key,
                site_key,
                project_id,
            }
        } else {
            Backend::Disabled
        };

        Self {
            config,
            backend,
            client,
        }
    }

    /// Name of the active backend, for startup logging.
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Checkbox { .. } => "checkbox",
            Backend::RiskScore { .. } => "risk-score",
            Backend::Disabled => "disabled",
        }
    }

    /// Verify a client-supplied token.
    ///
    /// Skips verification (valid verdict) when no backend is configured
    /// or the client sent no token.
    pub async fn verify(&self, token: Option<&str>) -> Result<CaptchaVerdict, CaptchaError> {
        match (&self.backend, token) {
            (Backend::Disabled, _) => Ok(CaptchaVerdict::skipped("verification disabled")),
            (_, None) => Ok(CaptchaVerdict::skipped("no token supplied")),
            (Backend::Checkbox { secret }, Some(token)) => {
                self.verify_checkbox(secret, token).await
            }
            (
                Backend::RiskScore {
                    api_key,
                    site_key,
                    project_id,
                },
                Some(token),
            ) => {
                self.verify_risk_score(api_key, site_key, project_id, token)
                    .await
            }
        }
    }

    async fn verify_checkbox(
        &self,
        secret: &str,
        token: &str,
    ) -> Result<CaptchaVerdict, CaptchaError> {
        let response = self
            .client
            .post(&self.config.siteverify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await?;

        let body: SiteverifyResponse = response.json().await?;
        let verdict = verdict_from_siteverify(body);
        debug!(valid = verdict.valid, "Checkbox verification complete");
        Ok(verdict)
    }

    async fn verify_risk_score(
        &self,
        api_key: &str,
        site_key: &str,
        project_id: &str,
        token: &str,
    ) -> Result<CaptchaVerdict, CaptchaError> {
        let url = format!(
            "{}/v1/projects/{}/assessments?key={}",
            self.config.assessment_base_url, project_id, api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "event": {
                    "token": token,
                    "siteKey": site_key,
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: AssessmentResponse = response.json().await?;
        let verdict = verdict_from_assessment(body, self.config.min_score);
        if !verdict.valid {
            warn!(score = ?verdict.score, reason = ?verdict.reason, "Risk-score verification rejected token");
        }
        Ok(verdict)
    }
}

/// Checkbox siteverify response body.
#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Risk-score assessment response body (relevant subset).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentResponse {
    #[serde(default)]
    token_properties: Option<TokenProperties>,
    #[serde(default)]
    risk_analysis: Option<RiskAnalysis>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenProperties {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    invalid_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskAnalysis {
    #[serde(default)]
    score: f64,
}

fn verdict_from_siteverify(body: SiteverifyResponse) -> CaptchaVerdict {
    let reason = if body.error_codes.is_empty() {
        None
    } else {
        Some(body.error_codes.join(", "))
    };
    CaptchaVerdict {
        valid: body.success,
        score: None,
        reason,
    }
}

fn verdict_from_assessment(body: AssessmentResponse, min_score: f64) -> CaptchaVerdict {
    let token_valid = body
        .token_properties
        .as_ref()
        .map(|p| p.valid)
        .unwrap_or(false);
    let score = body.risk_analysis.as_ref().map(|r| r.score);

    let valid = token_valid && score.map(|s| s >= min_score).unwrap_or(false);
    let reason = if token_valid {
        score
            .filter(|s| *s < min_score)
            .map(|s| format!("score {} below minimum {}", s, min_score))
    } else {
        body.token_properties
            .and_then(|p| p.invalid_reason)
            .or_else(|| Some("token invalid".to_string()))
    };

    CaptchaVerdict {
        valid,
        score,
        reason: if valid { None } else { reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[test]
    fn test_backend_selection() {
        let verifier = CaptchaVerifier::new(CaptchaConfig::default(), client());
        assert_eq!(verifier.backend_name(), "disabled");

        let verifier = CaptchaVerifier::new(
            CaptchaConfig {
                secret: Some("shh".into()),
                ..Default::default()
            },
            client(),
        );
        assert_eq!(verifier.backend_name(), "checkbox");

        let verifier = CaptchaVerifier::new(
            CaptchaConfig {
                api_key: Some("key".into()),
                site_key: Some("site".into()),
                project_id: Some("proj".into()),
                ..Default::default()
            },
            client(),
        );
        assert_eq!(verifier.backend_name(), "risk-score");
    }

    #[test]
    fn test_partial_risk_score_config_is_disabled() {
        let verifier = CaptchaVerifier::new(
            CaptchaConfig {
                api_key: Some("key".into()),
                ..Default::default()
            },
            client(),
        );
        assert_eq!(verifier.backend_name(), "disabled");
    }

    #[tokio::test]
    async fn test_disabled_backend_skips() {
        let verifier = CaptchaVerifier::new(CaptchaConfig::default(), client());
        let verdict = verifier.verify(Some("anything")).await.unwrap();
        assert!(verdict.valid);
    }

    #[tokio::test]
    async fn test_missing_token_skips() {
        let verifier = CaptchaVerifier::new(
            CaptchaConfig {
                secret: Some("shh".into()),
                ..Default::default()
            },
            client(),
        );
        let verdict = verifier.verify(None).await.unwrap();
        assert!(verdict.valid);
    }

    #[test]
    fn test_siteverify_verdict() {
        let body: SiteverifyResponse =
            serde_json::from_value(serde_json::json!({ "success": true })).unwrap();
        assert!(verdict_from_siteverify(body).valid);

        let body: SiteverifyResponse = serde_json::from_value(serde_json::json!({
            "success": false,
            "error-codes": ["invalid-input-response"]
        }))
        .unwrap();
        let verdict = verdict_from_siteverify(body);
        assert!(!verdict.valid);
        assert_eq!(verdict.reason.as_deref(), Some("invalid-input-response"));
    }

    #[test]
    fn test_assessment_verdict_requires_valid_token_and_score() {
        let body: AssessmentResponse = serde_json::from_value(serde_json::json!({
            "tokenProperties": { "valid": true },
            "riskAnalysis": { "score": 0.9 }
        }))
        .unwrap();
        let verdict = verdict_from_assessment(body, 0.5);
        assert!(verdict.valid);
        assert_eq!(verdict.score, Some(0.9));

        // Valid token, low score
        let body: AssessmentResponse = serde_json::from_value(serde_json::json!({
            "tokenProperties": { "valid": true },
            "riskAnalysis": { "score": 0.2 }
        }))
        .unwrap();
        let verdict = verdict_from_assessment(body, 0.5);
        assert!(!verdict.valid);

        // Invalid token, high score
        let body: AssessmentResponse = serde_json::from_value(serde_json::json!({
            "tokenProperties": { "valid": false, "invalidReason": "EXPIRED" },
            "riskAnalysis": { "score": 0.9 }
        }))
        .unwrap();
        let verdict = verdict_from_assessment(body, 0.5);
        assert!(!verdict.valid);
        assert_eq!(verdict.reason.as_deref(), Some("EXPIRED"));
    }

    #[test]
    fn test_assessment_verdict_at_threshold() {
        let body: AssessmentResponse = serde_json::from_value(serde_json::json!({
            "tokenProperties": { "valid": true },
            "riskAnalysis": { "score": 0.5 }
        }))
        .unwrap();
        assert!(verdict_from_assessment(body, 0.5).valid);
    }

    #[test]
    fn test_assessment_verdict_missing_sections() {
        let body: AssessmentResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!verdict_from_assessment(body, 0.5).valid);
    }
}
