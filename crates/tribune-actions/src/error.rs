use thiserror::Error;
use tribune_identity::{BlockOrderError, IdentityError};

/// Errors from the action/identity bridge
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action has no target id for {0}")]
    MissingTarget(String),

    #[error("Create action for {0} is missing its parent id")]
    MissingParent(String),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Block order error: {0}")]
    BlockOrder(#[from] BlockOrderError),
}

/// Result type for bridge operations
pub type ActionResult<T> = Result<T, ActionError>;
