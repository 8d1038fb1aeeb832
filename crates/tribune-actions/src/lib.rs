//! # Tribune Actions
//!
//! The bridge between submitted actions and the identifiers they
//! produce: deriving an entity's canonical id from an action, computing
//! the composed correlation key used before the server assigns a real
//! action id, rewriting actions to their pending aliases, and
//! regenerating ids once the actions they were built on confirm.

pub mod bridge;
pub mod compose;
pub mod error;

pub use bridge::{composed_id_from_action, id_from_action, regenerate_id_with_action};
pub use compose::{
    local_action_id, local_pending_block_order, now_timestamp, optimistic_action_id,
    pending_action_json, pending_block_order,
};
pub use error::{ActionError, ActionResult};
