// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission field validator.
//!
//! Implements the request-level validation rules:
//! - Required field presence (email, subject, message)
//! - Email shape validation
//! - Subject/message length caps
//! - Phone number format (when supplied)

use crate::config::ValidationConfig;
use thiserror::Error;
use tracing::debug;

/// Validation error types. The display strings are the exact bodies
/// returned to the caller with a 400.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields.")]
    MissingFields,

    #[error("Invalid email.")]
    InvalidEmail,

    #[error("Content too long.")]
    ContentTooLong,

    #[error("Invalid phone number.")]
    InvalidPhone,
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Submission fields are acceptable
    Valid,
    /// Submission is rejected
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Contact submission validator.
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a contact submission's fields.
    pub fn validate(
        &self,
        email: Option<&str>,
        subject: Option<&str>,
        message: Option<&str>,
        phone: Option<&str>,
    ) -> ValidationResult {
        let (email, subject, message) = match (
            non_empty(email),
            non_empty(subject),
            non_empty(message),
        ) {
            (Some(e), Some(s), Some(m)) => (e, s, m),
            _ => {
                debug!("Missing required fields");
                return ValidationResult::Invalid(ValidationError::MissingFields);
            }
        };

        if !is_plausible_email(email) {
            debug!("Email failed shape check");
            return ValidationResult::Invalid(ValidationError::InvalidEmail);
        }

        if subject.chars().count() > self.config.max_subject_chars
            || message.chars().count() > self.config.max_message_chars
        {
            debug!(
                subject_chars = subject.chars().count(),
                message_chars = message.chars().count(),
                "Content too long"
            );
            return ValidationResult::Invalid(ValidationError::ContentTooLong);
        }

        if let Some(phone) = non_empty(phone) {
            if !is_plausible_phone(phone) {
                debug!("Phone failed format check");
                return ValidationResult::Invalid(ValidationError::InvalidPhone);
            }
        }

        ValidationResult::Valid
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// RFC-5322-ish shape check: a single `@`, no whitespace, and a dotted
/// domain with characters on both sides of the last dot.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty(),
        None => false,
    }
}

/// Phone numbers: digits plus `- +()` separators, 6 to 20 characters.
fn is_plausible_phone(phone: &str) -> bool {
    let len = phone.chars().count();
    (6..=20).contains(&len)
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | ' ' | '+' | '(' | ')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_validator() -> SubmissionValidator {
        SubmissionValidator::new(ValidationConfig::default())
    }

    #[test]
    fn test_valid_submission() {
        let validator = default_validator();
        let result = validator.validate(
            Some("a@b.com"),
            Some("Hi"),
            Some("Test"),
            Some("+44 20 7946 0000"),
        );
        assert!(result.is_valid());
    }

    #[test]
    fn test_missing_fields() {
        let validator = default_validator();

        let result = validator.validate(None, Some("Hi"), Some("Test"), None);
        assert_eq!(result.error(), Some(&ValidationError::MissingFields));

        // Empty strings count as missing.
        let result = validator.validate(Some("a@b.com"), Some(""), Some("Test"), None);
        assert_eq!(result.error(), Some(&ValidationError::MissingFields));
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_plausible_email("a@b.com"));
        assert!(is_plausible_email("first.last@sub.example.co.uk"));

        assert!(!is_plausible_email("not-an-email"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("a@@b.com"));
        assert!(!is_plausible_email("a b@c.com"));
        assert!(!is_plausible_email("@b.com"));
        assert!(!is_plausible_email("a@.com"));
        assert!(!is_plausible_email("a@b."));
    }

    #[test]
    fn test_content_length_caps() {
        let validator = default_validator();

        let subject_161: String = "x".repeat(161);
        let result = validator.validate(Some("a@b.com"), Some(&subject_161), Some("Test"), None);
        assert_eq!(result.error(), Some(&ValidationError::ContentTooLong));

        let message_5001: String = "y".repeat(5001);
        let result = validator.validate(Some("a@b.com"), Some("Hi"), Some(&message_5001), None);
        assert_eq!(result.error(), Some(&ValidationError::ContentTooLong));

        // At the cap is fine.
        let subject_160: String = "x".repeat(160);
        let result = validator.validate(Some("a@b.com"), Some(&subject_160), Some("Test"), None);
        assert!(result.is_valid());
    }

    #[test]
    fn test_phone_format() {
        let validator = default_validator();

        let result = validator.validate(Some("a@b.com"), Some("Hi"), Some("Test"), Some("abc123"));
        assert_eq!(result.error(), Some(&ValidationError::InvalidPhone));

        // Too short
        let result = validator.validate(Some("a@b.com"), Some("Hi"), Some("Test"), Some("12345"));
        assert_eq!(result.error(), Some(&ValidationError::InvalidPhone));

        // Absent phone is fine
        let result = validator.validate(Some("a@b.com"), Some("Hi"), Some("Test"), None);
        assert!(result.is_valid());
    }

    #[test]
    fn test_error_messages_match_response_bodies() {
        assert_eq!(ValidationError::MissingFields.to_string(), "Missing required fields.");
        assert_eq!(ValidationError::InvalidEmail.to_string(), "Invalid email.");
        assert_eq!(ValidationError::ContentTooLong.to_string(), "Content too long.");
        assert_eq!(ValidationError::InvalidPhone.to_string(), "Invalid phone number.");
    }
}
