// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),

    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// Reject empty or whitespace-only values
pub(crate) fn require_non_blank(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::BlankField(field));
    }
    Ok(())
}
