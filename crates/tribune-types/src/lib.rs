//! # Tribune Types
//!
//! Shared data model for the Tribune client reconciliation core: the
//! entity taxonomy, action and entity JSON shapes, and the status
//! lifecycle that the identity codec, overlay engine, and pending store
//! all agree on.
//!
//! Everything here is serde round-trippable; type-specific entity fields
//! ride in a `serde_json` map rather than one struct per entity kind, so
//! new server-side fields pass through the client untouched.

pub mod action;
pub mod entity;
pub mod error;

pub use action::{ActionJson, ActionRecord, Crud, EntityStatus};
pub use entity::{EntityJson, EntityType, IdShape};
pub use error::{TypeError, TypeResult};
