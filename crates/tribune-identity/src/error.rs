use thiserror::Error;

/// Errors that can occur while generating identifiers.
///
/// Parsing never errors: malformed input degrades to
/// [`crate::ParsedId::Unknown`], since opaque strings (DIDs, wallet
/// addresses) legitimately flow through identity-aware code paths.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Entity type {entity_type} uses the {expected} id shape, not {requested}")]
    WrongShape {
        entity_type: String,
        expected: String,
        requested: String,
    },

    #[error("Postbox generation for {0} requires a parent id")]
    MissingParent(String),

    #[error("Forum ids are roots and take no parent")]
    UnexpectedParent,

    #[error("Parent id is not a postbox id: {0}")]
    MalformedParent(String),

    #[error("Invalid block order: {0}")]
    BlockOrder(#[from] BlockOrderError),
}

/// Errors from the block-order codec
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockOrderError {
    #[error("Block order hex has length {0}, expected 32 (canonical) or 20 (epoch)")]
    InvalidLength(usize),

    #[error("Block order field is not hex: {0}")]
    InvalidHex(String),

    #[error("Epoch-compressed block order supplied without an epoch")]
    EpochRequired,
}

/// Result type for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;
