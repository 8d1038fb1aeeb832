use thiserror::Error;
use tribune_actions::ActionError;
use tribune_types::EntityStatus;

pub type PendingResult<T> = Result<T, PendingError>;

#[derive(Debug, Error)]
pub enum PendingError {
    #[error("no pending action under alias {0}")]
    UnknownAlias(String),

    #[error("action {action_id} rejected with status {status}")]
    ActionRejected {
        action_id: String,
        status: EntityStatus,
    },

    #[error("confirmation for {0} carried no action record")]
    MissingConfirmation(String),

    #[error(transparent)]
    Action(#[from] ActionError),
}
