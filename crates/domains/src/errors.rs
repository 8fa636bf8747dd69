//! # DomainError
//!
//! Centralized error handling for the yamdb core.
//! Every failure is detected where the mutation or query is attempted and
//! handed back to the caller as one of these variants.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The author already reviewed this title.
    #[error("a review by this author already exists for this title")]
    DuplicateReview,

    /// Score outside the inclusive 1..=10 range.
    #[error("score must be between 1 and 10, got {0}")]
    InvalidScore(i64),

    /// The actor is known but the policy denies the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The action requires an authenticated actor.
    #[error("authentication credentials were not provided")]
    Unauthenticated,

    #[error("username `me` is reserved")]
    ReservedUsername,

    /// Offending characters, each reported once in order of first appearance.
    #[error("username contains forbidden characters: {}", format_chars(.0))]
    InvalidUsername(Vec<char>),

    #[error("user `{0}` not found")]
    UserNotFound(String),

    #[error("confirmation code is invalid")]
    InvalidConfirmationCode,

    /// Sign-up repeated for a known username with another email address.
    #[error("email does not match the one registered for this username")]
    EmailMismatch,

    /// Resource not found (e.g., Title, Review, Category slug)
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Resource already exists (e.g., duplicate genre slug, taken email)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Field-level validation failure (e.g., empty text, year out of range)
    #[error("validation error: {0}")]
    Validation(String),

    /// Infrastructure failure (e.g., DB down, signing key unusable)
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

fn format_chars(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A specialized Result type for yamdb logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_username_lists_each_character() {
        let err = DomainError::InvalidUsername(vec![' ', '!']);
        assert_eq!(
            err.to_string(),
            "username contains forbidden characters: ' ', '!'"
        );
    }

    #[test]
    fn not_found_names_entity_and_key() {
        let err = DomainError::not_found("title", 42);
        assert_eq!(err.to_string(), "title not found: 42");
    }
}
