//! The overlay engine's three-part output and its merge law.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tribune_types::{Crud, EntityJson};

/// Fields that accumulate across pending edits instead of overwriting.
/// Two pending upvotes on the same count must sum to +2.
pub const COUNTER_FIELDS: &[&str] = &[
    "upVotes",
    "downVotes",
    "postCount",
    "topicCount",
    "voteCount",
    "pinCount",
    "notificationCount",
];

/// A partial delta against an already-known entity, keyed by the
/// normalized target id.
#[derive(Debug, Clone, PartialEq)]
pub struct EditEntry {
    pub crud: Crud,
    pub fields: Map<String, Value>,
}

impl EditEntry {
    pub fn new(crud: Crud) -> Self {
        Self {
            crud,
            fields: Map::new(),
        }
    }

    pub fn with_fields(crud: Crud, fields: Map<String, Value>) -> Self {
        Self { crud, fields }
    }

    /// Merge another delta into this one: last writer wins per field,
    /// except counter fields, which accumulate.
    pub fn merge_from(&mut self, other: &EditEntry) {
        self.crud = other.crud;
        for (key, value) in &other.fields {
            if COUNTER_FIELDS.contains(&key.as_str()) {
                let prior = self.fields.get(key).and_then(Value::as_i64).unwrap_or(0);
                let delta = value.as_i64().unwrap_or(0);
                self.fields.insert(key.clone(), Value::from(prior + delta));
            } else {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Combined output of the overlay mutators.
///
/// Invariant: a normalized id appears in at most one of
/// `entities`/`active`; `edits` entries may coexist with either.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayOutput {
    /// normalizedId -> fully synthesized placeholder
    pub entities: BTreeMap<String, EntityJson>,

    /// normalizedId -> partial field delta
    pub edits: BTreeMap<String, EditEntry>,

    /// normalizedId -> concrete id of an already-confirmed entity
    pub active: BTreeMap<String, String>,
}

impl OverlayOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.edits.is_empty() && self.active.is_empty()
    }

    pub fn push_entity(&mut self, normalized_id: impl Into<String>, entity: EntityJson) {
        self.entities.insert(normalized_id.into(), entity);
    }

    pub fn push_edit(&mut self, normalized_id: impl Into<String>, edit: EditEntry) {
        let key = normalized_id.into();
        match self.edits.get_mut(&key) {
            Some(existing) => existing.merge_from(&edit),
            None => {
                self.edits.insert(key, edit);
            }
        }
    }

    pub fn push_active(&mut self, normalized_id: impl Into<String>, concrete_id: impl Into<String>) {
        let key = normalized_id.into();
        self.entities.remove(&key);
        self.active.insert(key, concrete_id.into());
    }

    /// Associative combination of two mutator outputs. A confirmed
    /// redirect always beats a synthesized placeholder for the same
    /// normalized id, so the overlay never shadows confirmed data.
    pub fn merge(mut self, other: OverlayOutput) -> OverlayOutput {
        for (key, entity) in other.entities {
            self.entities.insert(key, entity);
        }
        for (key, edit) in other.edits {
            self.push_edit(key, edit);
        }
        for (key, concrete) in other.active {
            self.active.insert(key, concrete);
        }
        let active = &self.active;
        self.entities.retain(|key, _| !active.contains_key(key));
        self
    }
}
