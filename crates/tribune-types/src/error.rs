use thiserror::Error;

/// Errors that can occur while interpreting the shared data model
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("Unknown entity type code: {0}")]
    UnknownEntityType(u32),

    #[error("Unknown entity type name: {0}")]
    UnknownEntityTypeName(String),

    #[error("Unknown crud kind: {0}")]
    UnknownCrud(String),
}

/// Result type for data-model operations
pub type TypeResult<T> = Result<T, TypeError>;
