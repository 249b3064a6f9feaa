// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gateway Service
//!
//! Abuse-mitigation and delivery pipeline for the 360ace.Tech contact
//! form:
//!
//! - 10 requests / 60s per client key (default)
//! - Field validation (email shape, length caps, phone format)
//! - Honeypot and dwell-time heuristics with masked rejections
//! - CAPTCHA verification (checkbox or risk-score backend)
//! - Transactional email delivery via SendGrid
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `RATE_WINDOW_MS` / `RATE_MAX`: throttle window and capacity
//! - `CONTACT_MIN_SUBMIT_MS`: minimum form dwell time (default: 2000)
//! - `RECAPTCHA_SECRET`: enables the checkbox CAPTCHA backend
//! - `RECAPTCHA_API_KEY` / `RECAPTCHA_SITE_KEY` / `RECAPTCHA_PROJECT_ID`:
//!   enable the risk-score backend (`RECAPTCHA_MIN_SCORE`, default 0.5)
//! - `SENDGRID_API_KEY`: enables email delivery
//! - `CONTACT_TO_EMAIL` / `CONTACT_FROM_EMAIL` / `CONTACT_SUBJECT_PREFIX`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_gateway::{
    antispam::SpamHeuristics,
    captcha::CaptchaVerifier,
    config::{AntispamConfig, CaptchaConfig, Config, EmailConfig, ThrottleConfig},
    handlers::{self, AppState},
    metrics::Metrics,
    notify::NotificationDispatcher,
    throttle::RequestThrottle,
    validator::SubmissionValidator,
};

/// Timeout applied to all outbound provider calls.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        window_ms = config.throttle.window_ms,
        max_requests = config.throttle.max_requests,
        min_submit_ms = config.antispam.min_submit_ms,
        "Starting contact gateway"
    );

    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_TIMEOUT)
        .build()?;

    let captcha = CaptchaVerifier::new(config.captcha.clone(), http.clone());
    info!(
        captcha_backend = captcha.backend_name(),
        email_configured = config.email.api_key.is_some(),
        "Anti-abuse configuration loaded"
    );

    // Create application state
    let state = Arc::new(AppState {
        throttle: RequestThrottle::new(config.throttle.clone()),
        validator: SubmissionValidator::new(config.validation.clone()),
        antispam: SpamHeuristics::new(config.antispam.clone()),
        captcha,
        dispatcher: NotificationDispatcher::new(config.email.clone(), http),
        metrics: Metrics::new()?,
        config: config.clone(),
    });

    // Spawn throttle sweep task
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweep_state.throttle.sweep(Instant::now()).await;
        }
    });

    // Build router
    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        throttle: ThrottleConfig {
            window_ms: env_parsed("RATE_WINDOW_MS", 60_000),
            max_requests: env_parsed("RATE_MAX", 10),
        },
        antispam: AntispamConfig {
            min_submit_ms: env_parsed("CONTACT_MIN_SUBMIT_MS", 2000),
        },
        captcha: CaptchaConfig {
            secret: env_opt("RECAPTCHA_SECRET"),
            api_key: env_opt("RECAPTCHA_API_KEY"),
            site_key: env_opt("RECAPTCHA_SITE_KEY"),
            project_id: env_opt("RECAPTCHA_PROJECT_ID"),
            min_score: env_parsed("RECAPTCHA_MIN_SCORE", 0.5),
            ..Default::default()
        },
        email: EmailConfig {
            api_key: env_opt("SENDGRID_API_KEY"),
            to_email: std::env::var("CONTACT_TO_EMAIL")
                .unwrap_or_else(|_| "hello@360ace.tech".to_string()),
            from_email: std::env::var("CONTACT_FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@360ace.tech".to_string()),
            subject_prefix: std::env::var("CONTACT_SUBJECT_PREFIX")
                .unwrap_or_else(|_| "New contact".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
