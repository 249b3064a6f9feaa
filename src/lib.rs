// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Gateway
//!
//! This crate provides the abuse-mitigation and delivery pipeline behind
//! the 360ace.Tech contact form:
//!
//! - Per-IP fixed-window rate limiting (10 requests / 60s default)
//! - Field validation (email shape, length caps, phone format)
//! - Honeypot and dwell-time spam heuristics with masked rejections
//! - CAPTCHA verification (checkbox or risk-score backend)
//! - Transactional email delivery via SendGrid

pub mod antispam;
pub mod captcha;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod notify;
pub mod throttle;
pub mod validator;

pub use config::Config;
pub use throttle::{RequestThrottle, ThrottleDecision};
pub use validator::{SubmissionValidator, ValidationResult};
