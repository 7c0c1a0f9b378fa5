// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable label for structured failure logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Domain(_) | AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Storage(_) => "storage",
            AppError::Ledger(_) => "ledger",
            AppError::Queue(_) => "queue",
            AppError::Database(_) => "database",
            AppError::Io(_) => "io",
            AppError::Serialization(_) => "serialization",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    /// Validation failures are never worth redelivering
    pub fn is_validation(&self) -> bool {
        self.kind() == "validation"
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error and aws-sdk errors are converted in the infra crates
// by mapping to AppError::{Database, Ledger, Queue, Storage}(String)

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_kind_labels() {
        let err: AppError = DomainError::BlankField("jobId").into();
        assert_eq!(err.kind(), "validation");
        assert!(err.is_validation());

        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.kind(), "io");
        assert!(!err.is_validation());

        assert_eq!(AppError::Storage("x".into()).kind(), "storage");
    }
}
