//! # Tribune Pending
//!
//! The pending state store: correlation records for unconfirmed
//! actions, indexed under every alias they wear between composition and
//! confirmation, plus the promotion protocol that reconciles them
//! against the records the server eventually returns.
//!
//! Lifecycle per action:
//! `Composing -> Pending (optimistic id) -> {Active, Deleted, Error, Timeout, Canceled}`.

pub mod error;
pub mod record;
pub mod store;

pub use error::{PendingError, PendingResult};
pub use record::Pending;
pub use store::{PendingSnapshot, PendingStore, SubmissionResult};
