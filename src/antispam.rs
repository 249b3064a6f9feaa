// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lightweight anti-bot heuristics.
//!
//! Two checks run before any external call is made:
//! - Honeypot: a form field hidden from human users; any non-empty value
//!   marks the submission as automated.
//! - Dwell time: submissions arriving faster than a plausible human
//!   form-fill (2s default) after the form was rendered are presumed
//!   automated.
//!
//! Rejections here are masked: the caller maps them to a 200-shaped
//! response with a generic body so automated senders get no detection
//! feedback. Do not surface these as errors.

use crate::config::AntispamConfig;
use tracing::info;

/// Why a submission was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamSignal {
    /// The hidden honeypot field was filled in
    HoneypotFilled,
    /// The form was submitted faster than the configured minimum dwell time
    SubmittedTooFast,
}

impl SpamSignal {
    /// The deliberately vague body returned to the caller. Phrasing is
    /// load-bearing: it must not reveal which check fired.
    pub fn masked_message(&self) -> &'static str {
        match self {
            Self::HoneypotFilled => "Unable to send at this time.",
            Self::SubmittedTooFast => "Please wait a moment and try again.",
        }
    }
}

impl std::fmt::Display for SpamSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HoneypotFilled => write!(f, "honeypot field filled"),
            Self::SubmittedTooFast => write!(f, "submitted below minimum dwell time"),
        }
    }
}

/// Result of the heuristic pass.
#[derive(Debug, Clone, Copy)]
pub enum SpamVerdict {
    /// No bot signal detected
    Pass,
    /// Submission flagged; respond with the signal's masked message
    SoftReject(SpamSignal),
}

/// Heuristic evaluator for contact submissions.
pub struct SpamHeuristics {
    config: AntispamConfig,
}

impl SpamHeuristics {
    /// Create a new evaluator with the given configuration.
    pub fn new(config: AntispamConfig) -> Self {
        Self { config }
    }

    /// Evaluate a submission's bot signals.
    ///
    /// `rendered_at_ms` is the client-reported epoch-ms timestamp of the
    /// form render; it is only trusted in one direction (a small delta
    /// flags the submission, a large or absent one proves nothing).
    pub fn evaluate(
        &self,
        honeypot: Option<&str>,
        rendered_at_ms: Option<i64>,
        now_ms: i64,
    ) -> SpamVerdict {
        if let Some(hp) = honeypot {
            if !hp.trim().is_empty() {
                info!("Honeypot field filled, masking rejection");
                return SpamVerdict::SoftReject(SpamSignal::HoneypotFilled);
            }
        }

        if let Some(rendered_at) = rendered_at_ms {
            if rendered_at > 0 {
                let elapsed = now_ms - rendered_at;
                if elapsed < self.config.min_submit_ms as i64 {
                    info!(elapsed_ms = elapsed, "Submission below minimum dwell time");
                    return SpamVerdict::SoftReject(SpamSignal::SubmittedTooFast);
                }
            }
        }

        SpamVerdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristics() -> SpamHeuristics {
        SpamHeuristics::new(AntispamConfig { min_submit_ms: 2000 })
    }

    #[test]
    fn test_clean_submission_passes() {
        let verdict = heuristics().evaluate(None, Some(10_000), 20_000);
        assert!(matches!(verdict, SpamVerdict::Pass));
    }

    #[test]
    fn test_honeypot_rejects() {
        let verdict = heuristics().evaluate(Some("i-am-a-bot"), None, 20_000);
        assert!(matches!(
            verdict,
            SpamVerdict::SoftReject(SpamSignal::HoneypotFilled)
        ));
    }

    #[test]
    fn test_whitespace_honeypot_passes() {
        let verdict = heuristics().evaluate(Some("   "), None, 20_000);
        assert!(matches!(verdict, SpamVerdict::Pass));
    }

    #[test]
    fn test_fast_submission_rejects() {
        // 500ms between render and submit, below the 2s minimum.
        let verdict = heuristics().evaluate(None, Some(19_500), 20_000);
        assert!(matches!(
            verdict,
            SpamVerdict::SoftReject(SpamSignal::SubmittedTooFast)
        ));
    }

    #[test]
    fn test_boundary_dwell_time_passes() {
        let verdict = heuristics().evaluate(None, Some(18_000), 20_000);
        assert!(matches!(verdict, SpamVerdict::Pass));
    }

    #[test]
    fn test_zero_render_timestamp_ignored() {
        let verdict = heuristics().evaluate(None, Some(0), 20_000);
        assert!(matches!(verdict, SpamVerdict::Pass));
    }

    #[test]
    fn test_honeypot_checked_before_timing() {
        let verdict = heuristics().evaluate(Some("bot"), Some(19_900), 20_000);
        assert!(matches!(
            verdict,
            SpamVerdict::SoftReject(SpamSignal::HoneypotFilled)
        ));
    }

    #[test]
    fn test_masked_messages_are_generic() {
        assert_eq!(
            SpamSignal::HoneypotFilled.masked_message(),
            "Unable to send at this time."
        );
        assert_eq!(
            SpamSignal::SubmittedTooFast.masked_message(),
            "Please wait a moment and try again."
        );
    }
}
