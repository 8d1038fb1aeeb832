//! The correlation record carried for each unconfirmed action.

use std::collections::{BTreeMap, BTreeSet};

use tribune_overlay::OverlayOutput;
use tribune_types::{ActionRecord, EntityStatus};

/// Everything the store knows about one unconfirmed action, under every
/// alias it has worn so far.
///
/// Created at compose time, or on first sight of a not-yet-active
/// record that arrived from elsewhere; merged whenever partial
/// information shows up under any alias; deleted once the action
/// reaches a terminal status and its dependents have been promoted.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    /// Local counter alias, `Pending{n}`. The primary store key.
    pub pending_action_id: String,

    /// Optimistic alias `{ts}?{hash}`, once the action has been signed
    pub action_id: Option<String>,

    /// Server-assigned id, once confirmed
    pub real_action_id: Option<String>,

    /// Correlation key `targetId,chainHex,hash`, once the hash exists
    pub composed_id: Option<String>,

    /// Provisional block order assigned at submission
    pub pending_block_order: Option<String>,

    /// Session-local block order assigned at compose time
    pub local_pending_block_order: String,

    /// Every alias this action answers to
    pub pending_ids: BTreeSet<String>,

    /// Normalized ids of the entities this action synthesized, back to
    /// the primary alias
    pub normalized_id_to_pending_id: BTreeMap<String, String>,

    /// The action in its current best-known form
    pub record: ActionRecord,

    /// This action's contribution to the overlay
    pub overlay: OverlayOutput,

    pub status: EntityStatus,
}

impl Pending {
    pub fn new(pending_action_id: String, record: ActionRecord, overlay: OverlayOutput) -> Self {
        let mut pending_ids = BTreeSet::new();
        pending_ids.insert(pending_action_id.clone());
        let normalized_id_to_pending_id = overlay
            .entities
            .keys()
            .map(|normalized| (normalized.clone(), pending_action_id.clone()))
            .collect();
        Self {
            pending_action_id,
            action_id: None,
            real_action_id: None,
            composed_id: None,
            pending_block_order: None,
            local_pending_block_order: record.block_order.clone(),
            pending_ids,
            normalized_id_to_pending_id,
            record,
            overlay,
            status: EntityStatus::Pending,
        }
    }

    /// Fold in partial information that arrived under another alias.
    pub fn merge(&mut self, other: Pending) {
        self.action_id = self.action_id.take().or(other.action_id);
        self.real_action_id = self.real_action_id.take().or(other.real_action_id);
        self.composed_id = self.composed_id.take().or(other.composed_id);
        self.pending_block_order = self.pending_block_order.take().or(other.pending_block_order);
        self.pending_ids.extend(other.pending_ids);
        self.normalized_id_to_pending_id
            .extend(other.normalized_id_to_pending_id);
        if other.status.is_terminal() {
            self.status = other.status;
        }
    }

    /// Rebuild the synthesized-id index after the overlay changed.
    pub fn reindex(&mut self) {
        self.normalized_id_to_pending_id = self
            .overlay
            .entities
            .keys()
            .map(|normalized| (normalized.clone(), self.pending_action_id.clone()))
            .collect();
    }
}
