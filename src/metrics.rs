// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the contact pipeline.
//!
//! One counter, labelled by terminal pipeline outcome, exposed in text
//! format at the configured metrics path.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Terminal outcome labels.
pub mod outcome {
    pub const DENIED: &str = "denied";
    pub const INVALID: &str = "invalid";
    pub const SOFT_REJECTED: &str = "soft_rejected";
    pub const CAPTCHA_FAILED: &str = "captcha_failed";
    pub const CAPTCHA_UNAVAILABLE: &str = "captcha_unavailable";
    pub const SENT: &str = "sent";
    pub const DELIVERY_FAILED: &str = "delivery_failed";
    pub const NOT_CONFIGURED: &str = "not_configured";
}

/// Pipeline metrics registry.
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
}

impl Metrics {
    /// Create and register the pipeline metrics.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Contact submissions by terminal pipeline outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(submissions.clone()))?;
        Ok(Self {
            registry,
            submissions,
        })
    }

    /// Count one submission reaching the given terminal outcome.
    pub fn record(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
