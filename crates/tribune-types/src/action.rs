use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityType;
use crate::error::TypeError;

/// Kind of mutation an action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Crud {
    /// Create a new entity
    Post,

    /// Edit an existing entity
    Put,

    /// Delete an existing entity
    Delete,
}

impl Display for Crud {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Crud::Post => write!(f, "post"),
            Crud::Put => write!(f, "put"),
            Crud::Delete => write!(f, "delete"),
        }
    }
}

impl TryFrom<&str> for Crud {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "post" => Ok(Crud::Post),
            "put" => Ok(Crud::Put),
            "delete" => Ok(Crud::Delete),
            other => Err(TypeError::UnknownCrud(other.to_string())),
        }
    }
}

/// Lifecycle status shared by actions and the entities they produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityStatus {
    /// Submitted but not yet confirmed by the server
    Pending,

    /// Confirmed and live
    Active,

    /// Confirmed as deleted
    Deleted,

    /// Rejected by the server
    Error,

    /// No confirmation arrived in time
    Timeout,

    /// Withdrawn by the client before confirmation
    Canceled,
}

impl EntityStatus {
    /// Whether this status ends the pending lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntityStatus::Pending)
    }

    /// Whether this status means the action will never take effect.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EntityStatus::Error | EntityStatus::Timeout | EntityStatus::Canceled
        )
    }
}

impl Display for EntityStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EntityStatus::Pending => write!(f, "pending"),
            EntityStatus::Active => write!(f, "active"),
            EntityStatus::Deleted => write!(f, "deleted"),
            EntityStatus::Error => write!(f, "error"),
            EntityStatus::Timeout => write!(f, "timeout"),
            EntityStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// The mutation payload of an action, as signed and submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionJson {
    /// What the action does
    pub crud: Crud,

    /// Kind of entity the action targets
    pub entity_type: EntityType,

    /// Structural parent for creates (the id a new entity hangs under)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Existing target for edits and deletes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crud_entity_id: Option<String>,

    /// Type-specific payload fields
    #[serde(default)]
    pub params: Value,
}

impl ActionJson {
    /// The id the action is aimed at: the existing entity for edits and
    /// deletes, the parent for creates.
    pub fn target_id(&self) -> Option<&str> {
        match self.crud {
            Crud::Post => self.parent_id.as_deref(),
            Crud::Put | Crud::Delete => self.crud_entity_id.as_deref(),
        }
    }

    /// Read a payload field by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Read a string payload field by name.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Read an integer payload field by name.
    pub fn param_i64(&self, name: &str) -> Option<i64> {
        self.params.get(name).and_then(Value::as_i64)
    }
}

/// An action together with its identity and confirmation state.
///
/// Invariant: `id == action_id` (or `action_id == pending_id`) exactly
/// when the record represents the action itself rather than an entity
/// derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Canonical id of the record
    pub id: String,

    /// Server-assigned (or optimistic) action id
    pub action_id: String,

    /// Client-side alias the action wears before confirmation; starts
    /// as a local counter and moves to the optimistic form at submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_id: Option<String>,

    /// The mutation payload
    pub action: ActionJson,

    /// Chain the action was submitted on
    pub chain_id: u16,

    /// DID or address of the submitter
    pub creator_id: String,

    /// Packed block-order key
    pub block_order: String,

    /// Confirmation state
    pub status: EntityStatus,
}

impl ActionRecord {
    /// Whether this record is the action itself (not a derived entity).
    pub fn is_self_record(&self) -> bool {
        self.id == self.action_id
            || self
                .pending_id
                .as_deref()
                .is_some_and(|p| p == self.action_id)
    }
}
