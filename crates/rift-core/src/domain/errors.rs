//! Domain error types

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A resolution was built without a status label
    #[error("Resolution status must not be empty (strategy {0})")]
    EmptyStatus(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidId("xyz".to_string());
        assert_eq!(err.to_string(), "Invalid ID format: xyz");

        let err = DomainError::EmptyStatus("auto_merge".to_string());
        assert_eq!(
            err.to_string(),
            "Resolution status must not be empty (strategy auto_merge)"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::ValidationFailed("a".to_string());
        let err2 = DomainError::ValidationFailed("a".to_string());
        let err3 = DomainError::ValidationFailed("b".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
