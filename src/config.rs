// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact gateway.
//!
//! Every knob has a sensible default so the service starts with no
//! environment at all; anti-abuse backends and email delivery activate
//! only when their credentials are present.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the contact gateway service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Field validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Spam heuristics configuration
    #[serde(default)]
    pub antispam: AntispamConfig,

    /// CAPTCHA verification configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Email delivery configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Fixed-window rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Window length in milliseconds (default: 60000)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Maximum admitted requests per window per client key (default: 10)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

/// Field validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum subject length in characters (default: 160)
    #[serde(default = "default_max_subject")]
    pub max_subject_chars: usize,

    /// Maximum message length in characters (default: 5000)
    #[serde(default = "default_max_message")]
    pub max_message_chars: usize,
}

/// Spam heuristics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntispamConfig {
    /// Minimum plausible form dwell time in milliseconds (default: 2000)
    #[serde(default = "default_min_submit_ms")]
    pub min_submit_ms: u64,
}

/// CAPTCHA verification configuration.
///
/// The backend is selected by which credentials are set: `secret` picks
/// the checkbox verifier; `api_key` + `site_key` + `project_id` pick the
/// risk-score verifier. With neither, verification is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Shared secret for the checkbox verifier
    #[serde(default)]
    pub secret: Option<String>,

    /// API key for the risk-score verifier
    #[serde(default)]
    pub api_key: Option<String>,

    /// Site key submitted alongside risk-score assessments
    #[serde(default)]
    pub site_key: Option<String>,

    /// Cloud project owning the risk-score site key
    #[serde(default)]
    pub project_id: Option<String>,

    /// Minimum acceptable risk score (default: 0.5)
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Checkbox verification endpoint
    #[serde(default = "default_siteverify_url")]
    pub siteverify_url: String,

    /// Risk-score assessment API base URL
    #[serde(default = "default_assessment_base_url")]
    pub assessment_base_url: String,
}

/// Transactional email configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Delivery API key; delivery is reported unconfigured without it
    #[serde(default)]
    pub api_key: Option<String>,

    /// Recipient address (default: hello@360ace.tech)
    #[serde(default = "default_to_email")]
    pub to_email: String,

    /// Sender address (default: no-reply@360ace.tech)
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// Sender display name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Subject line prefix (default: "New contact")
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// Delivery API endpoint
    #[serde(default = "default_send_url")]
    pub send_url: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_requests() -> u32 {
    10
}

fn default_max_subject() -> usize {
    160
}

fn default_max_message() -> usize {
    5000
}

fn default_min_submit_ms() -> u64 {
    2000
}

fn default_min_score() -> f64 {
    0.5
}

fn default_siteverify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

fn default_assessment_base_url() -> String {
    "https://recaptchaenterprise.googleapis.com".to_string()
}

fn default_to_email() -> String {
    "hello@360ace.tech".to_string()
}

fn default_from_email() -> String {
    "no-reply@360ace.tech".to_string()
}

fn default_from_name() -> String {
    "360ace.Tech Contact Form".to_string()
}

fn default_subject_prefix() -> String {
    "New contact".to_string()
}

fn default_send_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            throttle: ThrottleConfig::default(),
            validation: ValidationConfig::default(),
            antispam: AntispamConfig::default(),
            captcha: CaptchaConfig::default(),
            email: EmailConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_subject_chars: default_max_subject(),
            max_message_chars: default_max_message(),
        }
    }
}

impl Default for AntispamConfig {
    fn default() -> Self {
        Self {
            min_submit_ms: default_min_submit_ms(),
        }
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            secret: None,
            api_key: None,
            site_key: None,
            project_id: None,
            min_score: default_min_score(),
            siteverify_url: default_siteverify_url(),
            assessment_base_url: default_assessment_base_url(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            to_email: default_to_email(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            subject_prefix: default_subject_prefix(),
            send_url: default_send_url(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl ThrottleConfig {
    /// Get the window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl CaptchaConfig {
    /// True when either verification backend has credentials.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
            || (self.api_key.is_some() && self.site_key.is_some() && self.project_id.is_some())
    }
}
