//! # Validation Error Types
//!
//! Structured errors for domain-primitive construction. Every validated
//! newtype in this crate reports failures through [`ValidationError`].

use thiserror::Error;

/// Errors from validating domain-primitive values at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Congressional district code does not match the `XX-NN` format.
    #[error("invalid district code: {0:?} (expected e.g. \"CA-12\" or \"AK-AL\")")]
    InvalidDistrictCode(String),

    /// Local district code contains characters outside the allowed set.
    #[error("invalid local district code: {0:?}")]
    InvalidLocalDistrictCode(String),

    /// Identity commitment is not 64 lowercase hex characters.
    #[error("invalid identity commitment: expected 64 lowercase hex chars, got {0:?}")]
    InvalidIdentityCommitment(String),

    /// Action domain is empty or contains characters outside the allowed set.
    #[error("invalid action domain: {0:?}")]
    InvalidActionDomain(String),

    /// Recipient identifier is empty or contains characters outside the allowed set.
    #[error("invalid recipient id: {0:?}")]
    InvalidRecipientId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_value() {
        let err = ValidationError::InvalidDistrictCode("nope".to_string());
        assert!(format!("{err}").contains("nope"));

        let err = ValidationError::InvalidActionDomain("".to_string());
        assert!(format!("{err}").contains("action domain"));
    }

    #[test]
    fn all_variants_are_debug() {
        let variants = vec![
            ValidationError::InvalidDistrictCode("a".into()),
            ValidationError::InvalidLocalDistrictCode("b".into()),
            ValidationError::InvalidIdentityCommitment("c".into()),
            ValidationError::InvalidActionDomain("d".into()),
            ValidationError::InvalidRecipientId("e".into()),
        ];
        for v in variants {
            assert!(!format!("{v:?}").is_empty());
        }
    }
}
