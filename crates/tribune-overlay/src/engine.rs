//! The overlay pipeline: one pass of independent, type-scoped mutators
//! over a single unconfirmed action.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tribune_identity::IdentityCodec;
use tribune_types::{ActionJson, ActionRecord, EntityJson, EntityStatus, EntityType};

use crate::mutators;
use crate::output::OverlayOutput;

/// Shared, read-only context handed to every mutator.
pub struct MutatorCtx<'a> {
    pub codec: &'a IdentityCodec,
    pub record: &'a ActionRecord,
    pub known: &'a HashMap<String, EntityJson>,

    /// Known entities re-indexed by normalized id, built once per pass
    normalized_known: HashMap<String, &'a EntityJson>,
}

impl<'a> MutatorCtx<'a> {
    pub fn new(
        codec: &'a IdentityCodec,
        record: &'a ActionRecord,
        known: &'a HashMap<String, EntityJson>,
    ) -> Self {
        let normalized_known = known
            .values()
            .map(|entity| (codec.normalize_id(&entity.id), entity))
            .collect();
        Self {
            codec,
            record,
            known,
            normalized_known,
        }
    }

    pub fn action(&self) -> &ActionJson {
        &self.record.action
    }

    pub fn normalize(&self, id: &str) -> String {
        self.codec.normalize_id(id)
    }

    /// Look up a known entity under either its concrete or normalized id.
    pub fn known_entity(&self, id: &str) -> Option<&'a EntityJson> {
        self.known
            .get(id)
            .or_else(|| self.normalized_known.get(&self.normalize(id)).copied())
    }

    /// Synthesize-or-redirect placement for a create target:
    /// - unknown target: synthesize a placeholder via `build`;
    /// - already Active: record a redirect so the overlay never shadows
    ///   confirmed data with a stale placeholder;
    /// - known but not yet Active: leave it alone (edits still apply).
    pub fn place(
        &self,
        out: &mut OverlayOutput,
        concrete_id: &str,
        build: impl FnOnce(&Self) -> EntityJson,
    ) {
        let normalized = self.normalize(concrete_id);
        match self.known_entity(concrete_id) {
            None => out.push_entity(normalized, build(self)),
            Some(entity) if entity.status == EntityStatus::Active => {
                out.push_active(normalized, entity.id.clone());
            }
            Some(_) => {}
        }
    }

    /// A placeholder stamped with this action's identity fields.
    pub fn placeholder(
        &self,
        entity_type: EntityType,
        id: &str,
        parent_id: Option<String>,
    ) -> EntityJson {
        EntityJson::placeholder(
            entity_type,
            id,
            &self.record.action_id,
            &self.record.block_order,
            &self.record.creator_id,
            self.record.chain_id,
            parent_id,
        )
    }

    /// The action params as a field map (empty when not an object),
    /// with `tags` split out since it lives on the entity base shape.
    pub fn params_fields(&self) -> Map<String, Value> {
        match &self.record.action.params {
            Value::Object(map) => {
                let mut fields = map.clone();
                fields.remove("tags");
                fields
            }
            _ => Map::new(),
        }
    }

    /// Tags carried in the action params.
    pub fn params_tags(&self) -> Vec<String> {
        self.record
            .action
            .params
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Run every mutator over one unconfirmed action and combine their
/// deltas. The merge is associative, so mutator order carries no
/// hidden meaning.
pub fn mutate_pending_from_action(
    codec: &IdentityCodec,
    record: &ActionRecord,
    known: &HashMap<String, EntityJson>,
) -> OverlayOutput {
    let ctx = MutatorCtx::new(codec, record, known);
    let pipeline: [fn(&MutatorCtx<'_>) -> OverlayOutput; 9] = [
        mutators::admin::apply,
        mutators::counts::apply,
        mutators::interaction_vote::apply,
        mutators::pin::apply,
        mutators::postbox::apply,
        mutators::profile::apply,
        mutators::user::apply,
        mutators::vote::apply,
        mutators::wallet::apply,
    ];
    pipeline
        .iter()
        .fold(OverlayOutput::new(), |acc, apply| acc.merge(apply(&ctx)))
}
