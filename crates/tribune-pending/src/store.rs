//! The pending state store.
//!
//! Writes serialize through one exclusive critical section per call;
//! readers take the last committed snapshot through an `Arc` swap and
//! never block a writer.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};
use tribune_actions::{
    composed_id_from_action, local_action_id, local_pending_block_order, optimistic_action_id,
    pending_action_json, pending_block_order, regenerate_id_with_action,
};
use tribune_identity::IdentityCodec;
use tribune_overlay::{mutate_pending_from_action, OverlayOutput};
use tribune_types::{ActionJson, ActionRecord, EntityJson, EntityStatus};

use crate::error::{PendingError, PendingResult};
use crate::record::Pending;

/// What the transport collaborator reports back after submitting an
/// action.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub status: EntityStatus,

    /// The confirmed record, when the server accepted the action
    pub confirmed_action: Option<ActionRecord>,
}

/// One committed view of the store. Cheap to hold; never mutated after
/// commit.
#[derive(Debug, Clone, Default)]
pub struct PendingSnapshot {
    /// Correlation records keyed by primary alias (`Pending{n}`)
    pending: BTreeMap<String, Pending>,

    /// Every alias (local, optimistic, hash, composed, normalized
    /// entity id) back to the primary alias
    aliases: BTreeMap<String, String>,

    /// Confirmed entities, keyed by concrete id
    known: HashMap<String, EntityJson>,

    /// Confirmed action records under every alias they once wore, for
    /// regenerating dependent ids
    confirmed_by_id: HashMap<String, ActionRecord>,

    /// Edits and redirects from already-confirmed actions that stand
    /// until fresh server state covers them
    confirmed: OverlayOutput,

    /// Cached fold of `confirmed` plus every pending contribution
    overlay: OverlayOutput,
}

impl PendingSnapshot {
    pub fn overlay(&self) -> &OverlayOutput {
        &self.overlay
    }

    pub fn known_entity(&self, id: &str) -> Option<&EntityJson> {
        self.known.get(id)
    }

    pub fn get(&self, alias: &str) -> Option<&Pending> {
        self.aliases.get(alias).and_then(|key| self.pending.get(key))
    }

    /// Unconfirmed actions in session order.
    pub fn pending_actions(&self) -> Vec<&ActionRecord> {
        let mut records: Vec<&ActionRecord> = self.pending.values().map(|p| &p.record).collect();
        records.sort_by(|a, b| a.block_order.cmp(&b.block_order));
        records
    }
}

/// Holds overlay output and correlation records indexed under every
/// alias, and drives each action through the promotion protocol:
/// compose, submit, then confirm or reject.
pub struct PendingStore {
    codec: Arc<IdentityCodec>,
    state: RwLock<StoreState>,
}

struct StoreState {
    snapshot: Arc<PendingSnapshot>,
    local_seq: u64,
}

impl PendingStore {
    pub fn new(codec: Arc<IdentityCodec>) -> Self {
        Self {
            codec,
            state: RwLock::new(StoreState {
                snapshot: Arc::new(PendingSnapshot::default()),
                local_seq: 0,
            }),
        }
    }

    /// The last committed view.
    pub fn snapshot(&self) -> Arc<PendingSnapshot> {
        self.state.read().unwrap().snapshot.clone()
    }

    /// Feed a confirmed entity into the known set, so later overlay
    /// passes redirect to it instead of synthesizing.
    pub fn insert_known(&self, entity: EntityJson) {
        let mut state = self.state.write().unwrap();
        let mut snap = (*state.snapshot).clone();
        snap.known.insert(entity.id.clone(), entity);
        commit(&mut state, snap);
    }

    /// Stage a freshly composed action under a local `Pending{n}` alias
    /// and fold its overlay contribution in.
    pub fn compose_action(
        &self,
        action: ActionJson,
        creator_id: &str,
        chain_id: u16,
        timestamp: u64,
    ) -> ActionRecord {
        let mut state = self.state.write().unwrap();
        state.local_seq += 1;
        let seq = state.local_seq;
        let alias = local_action_id(seq);

        let record = ActionRecord {
            id: alias.clone(),
            action_id: alias.clone(),
            pending_id: Some(alias.clone()),
            action,
            chain_id,
            creator_id: creator_id.to_string(),
            block_order: local_pending_block_order(timestamp, chain_id, seq).pack(None),
            status: EntityStatus::Pending,
        };

        let mut snap = (*state.snapshot).clone();
        let overlay = mutate_pending_from_action(&self.codec, &record, &snap.known);
        let pending = Pending::new(alias.clone(), record.clone(), overlay);
        debug!(alias, crud = %record.action.crud, entity_type = %record.action.entity_type, "composed pending action");
        snap.pending.insert(alias, pending);
        commit(&mut state, snap);
        record
    }

    /// Attach the signed hash: the action moves from its bare local
    /// alias to the optimistic `{ts}?{hash}` identity, gains its
    /// composed correlation key, and its overlay is recomputed under
    /// the new ids.
    pub fn mark_submitted(
        &self,
        alias: &str,
        hash: &str,
        timestamp: u64,
    ) -> PendingResult<ActionRecord> {
        let mut state = self.state.write().unwrap();
        let mut snap = (*state.snapshot).clone();
        let key = resolve(&snap, alias)?;
        let pending = snap
            .pending
            .get_mut(&key)
            .ok_or_else(|| PendingError::UnknownAlias(alias.to_string()))?;

        // The record stays a self record across the rename: id,
        // action_id, and pending_id all move to the optimistic alias
        // together.
        let optimistic = optimistic_action_id(timestamp, hash);
        pending.record.id = optimistic.clone();
        pending.record.action_id = optimistic.clone();
        pending.record.pending_id = Some(optimistic.clone());
        pending.record.block_order =
            pending_block_order(timestamp, pending.record.chain_id).pack(None);
        let composed = composed_id_from_action(&pending.record);

        pending.action_id = Some(optimistic.clone());
        pending.pending_block_order = Some(pending.record.block_order.clone());
        pending.composed_id = Some(composed.clone());
        pending.pending_ids.insert(optimistic.clone());
        pending.pending_ids.insert(hash.to_string());
        pending.pending_ids.insert(composed);
        debug!(alias = %key, optimistic, "pending action submitted");

        let record = pending.record.clone();
        refresh(&self.codec, &mut snap, &key);
        commit(&mut state, snap);
        Ok(record)
    }

    /// Register an unconfirmed action first seen from outside the
    /// compose path (another session, a replayed journal). Merges with
    /// any record already known under one of its aliases.
    pub fn observe_action(&self, record: ActionRecord) {
        if record.status != EntityStatus::Pending {
            return;
        }
        let alias = record
            .pending_id
            .clone()
            .unwrap_or_else(|| record.action_id.clone());

        let mut state = self.state.write().unwrap();
        let mut snap = (*state.snapshot).clone();
        let overlay = mutate_pending_from_action(&self.codec, &record, &snap.known);
        let mut incoming = Pending::new(alias.clone(), record.clone(), overlay);
        incoming.pending_ids.insert(record.action_id.clone());
        if record.action_id != alias {
            incoming.action_id = Some(record.action_id.clone());
        }

        match resolve(&snap, &alias).ok() {
            Some(key) => {
                if let Some(existing) = snap.pending.get_mut(&key) {
                    existing.merge(incoming);
                }
            }
            None => {
                debug!(alias, "observed external pending action");
                snap.pending.insert(alias, incoming);
            }
        }
        commit(&mut state, snap);
    }

    /// Consume the transport's verdict for one pending action.
    ///
    /// Acceptance promotes: synthesized entities move into the known
    /// set under their regenerated concrete ids, the action's edits
    /// stand keyed by normalized id, the alias set drops, and every
    /// surviving pending action is rewritten against the confirmed
    /// record. Rejection drops the alias set and the entities exclusive
    /// to it, and surfaces the rejection to the caller.
    pub fn handle_submission_result(
        &self,
        alias: &str,
        result: SubmissionResult,
    ) -> PendingResult<ActionRecord> {
        let mut state = self.state.write().unwrap();
        let mut snap = (*state.snapshot).clone();
        let key = resolve(&snap, alias)?;

        match result.status {
            EntityStatus::Pending => {
                let pending = snap
                    .pending
                    .get(&key)
                    .ok_or_else(|| PendingError::UnknownAlias(alias.to_string()))?;
                Ok(pending.record.clone())
            }
            EntityStatus::Active | EntityStatus::Deleted => {
                let mut pending = snap
                    .pending
                    .remove(&key)
                    .ok_or_else(|| PendingError::UnknownAlias(alias.to_string()))?;
                let confirmed = result
                    .confirmed_action
                    .ok_or_else(|| PendingError::MissingConfirmation(alias.to_string()))?;

                for worn in &pending.pending_ids {
                    snap.confirmed_by_id.insert(worn.clone(), confirmed.clone());
                }
                snap.confirmed_by_id
                    .insert(confirmed.action_id.clone(), confirmed.clone());

                // Promote this action's placeholders to confirmed rows.
                for (_, mut entity) in std::mem::take(&mut pending.overlay.entities) {
                    let concrete =
                        regenerate_id_with_action(&self.codec, &entity.id, &snap.confirmed_by_id);
                    entity.id = concrete.clone();
                    entity.action_id = confirmed.action_id.clone();
                    entity.block_order = confirmed.block_order.clone();
                    entity.status = EntityStatus::Active;
                    snap.known.insert(concrete, entity);
                }
                snap.confirmed = std::mem::take(&mut snap.confirmed).merge(pending.overlay);
                debug!(alias = %key, confirmed = %confirmed.action_id, "pending action confirmed");

                // Dependents composed against the optimistic ids can
                // now pick up the confirmed segments.
                let survivors: Vec<String> = snap.pending.keys().cloned().collect();
                for survivor in survivors {
                    refresh(&self.codec, &mut snap, &survivor);
                }
                commit(&mut state, snap);
                Ok(confirmed)
            }
            EntityStatus::Error | EntityStatus::Timeout | EntityStatus::Canceled => {
                snap.pending
                    .remove(&key)
                    .ok_or_else(|| PendingError::UnknownAlias(alias.to_string()))?;
                warn!(alias = %key, status = %result.status, "pending action rejected");
                commit(&mut state, snap);
                Err(PendingError::ActionRejected {
                    action_id: key,
                    status: result.status,
                })
            }
        }
    }

    pub fn get_by_action_id(&self, action_id: &str) -> Option<Pending> {
        self.snapshot().get(action_id).cloned()
    }

    pub fn get_by_composed_id(&self, composed_id: &str) -> Option<Pending> {
        self.snapshot().get(composed_id).cloned()
    }

    pub fn get_by_normalized_id(&self, normalized_id: &str) -> Option<Pending> {
        self.snapshot().get(normalized_id).cloned()
    }

    /// The "as of right now" view of a pending action, rewritten to its
    /// pending alias and provisional block order.
    pub fn get_pending_action_json(
        &self,
        alias: &str,
        timestamp: u64,
    ) -> PendingResult<ActionRecord> {
        let snapshot = self.snapshot();
        let pending = snapshot
            .get(alias)
            .ok_or_else(|| PendingError::UnknownAlias(alias.to_string()))?;
        Ok(pending_action_json(&self.codec, &pending.record, timestamp)?)
    }

    /// Drop a standing confirmed edit once fresh server state covers
    /// the entity it targeted.
    pub fn retire_confirmed(&self, normalized_id: &str) {
        let mut state = self.state.write().unwrap();
        let mut snap = (*state.snapshot).clone();
        snap.confirmed.edits.remove(normalized_id);
        snap.confirmed.active.remove(normalized_id);
        commit(&mut state, snap);
    }
}

fn resolve(snap: &PendingSnapshot, alias: &str) -> PendingResult<String> {
    snap.aliases
        .get(alias)
        .cloned()
        .ok_or_else(|| PendingError::UnknownAlias(alias.to_string()))
}

/// Rewrite one pending action against the confirmed records seen so
/// far and recompute its overlay contribution. Segments whose action
/// has not confirmed yet stay optimistic and are retried on the next
/// pass.
fn refresh(codec: &IdentityCodec, snap: &mut PendingSnapshot, key: &str) {
    let Some(pending) = snap.pending.get_mut(key) else {
        return;
    };
    let action = &mut pending.record.action;
    if let Some(parent) = action.parent_id.take() {
        action.parent_id = Some(regenerate_id_with_action(
            codec,
            &parent,
            &snap.confirmed_by_id,
        ));
    }
    if let Some(target) = action.crud_entity_id.take() {
        action.crud_entity_id = Some(regenerate_id_with_action(
            codec,
            &target,
            &snap.confirmed_by_id,
        ));
    }
    pending.overlay = mutate_pending_from_action(codec, &pending.record, &snap.known);
    pending.reindex();
}

/// Rebuild the derived indexes and swap the committed snapshot.
fn commit(state: &mut StoreState, mut snap: PendingSnapshot) {
    snap.aliases.clear();
    for (key, pending) in &snap.pending {
        for alias in &pending.pending_ids {
            snap.aliases.insert(alias.clone(), key.clone());
        }
        for normalized in pending.normalized_id_to_pending_id.keys() {
            snap.aliases.insert(normalized.clone(), key.clone());
        }
    }
    snap.overlay = snap
        .pending
        .values()
        .fold(snap.confirmed.clone(), |acc, p| acc.merge(p.overlay.clone()));
    state.snapshot = Arc::new(snap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tribune_identity::BlockOrder;
    use tribune_types::{Crud, EntityType};

    const ALICE: &str = "did:tribune:alice";

    fn store() -> PendingStore {
        PendingStore::new(Arc::new(IdentityCodec::new()))
    }

    fn create(entity_type: EntityType, parent_id: Option<&str>, params: serde_json::Value) -> ActionJson {
        ActionJson {
            crud: Crud::Post,
            entity_type,
            parent_id: parent_id.map(str::to_string),
            crud_entity_id: None,
            params,
        }
    }

    fn confirmed(hash: &str, action: ActionJson, block: u64, txn: u16) -> ActionRecord {
        ActionRecord {
            id: hash.to_string(),
            action_id: hash.to_string(),
            pending_id: None,
            action,
            chain_id: 3,
            creator_id: ALICE.to_string(),
            block_order: BlockOrder::new(1_700_000_100, 3, block, txn).pack(None),
            status: EntityStatus::Active,
        }
    }

    #[test]
    fn compose_and_submit_register_every_alias() {
        let store = store();
        let record = store.compose_action(
            create(EntityType::Forum, None, json!({ "title": "general" })),
            ALICE,
            3,
            1_700_000_000,
        );
        assert_eq!(record.action_id, "Pending1");
        assert!(store.get_by_action_id("Pending1").is_some());

        let submitted = store
            .mark_submitted("Pending1", "abcdef0123456789", 1_700_000_000)
            .unwrap();
        assert_eq!(submitted.action_id, "1700000000?abcdef0123456789");

        let pending = store
            .get_by_action_id("1700000000?abcdef0123456789")
            .unwrap();
        assert_eq!(pending.pending_action_id, "Pending1");
        assert!(store.get_by_action_id("abcdef0123456789").is_some());
        let composed = pending.composed_id.unwrap();
        assert!(store.get_by_composed_id(&composed).is_some());

        // The synthesized forum is reachable by its normalized id too.
        let snapshot = store.snapshot();
        let (normalized, _) = snapshot
            .overlay()
            .entities
            .iter()
            .find(|(_, e)| e.entity_type == EntityType::Forum)
            .unwrap();
        assert!(store.get_by_normalized_id(normalized).is_some());
    }

    #[test]
    fn submitted_record_remains_a_self_record() {
        let store = store();
        store.compose_action(
            create(EntityType::Forum, None, json!({ "title": "general" })),
            ALICE,
            3,
            1_700_000_000,
        );
        let submitted = store
            .mark_submitted("Pending1", "abcdef0123456789", 1_700_000_000)
            .unwrap();
        assert!(submitted.is_self_record());
        assert_eq!(submitted.id, submitted.action_id);

        // The "right now" view keeps the optimistic identity instead of
        // reshaping the action into a derived entity.
        let view = store
            .get_pending_action_json("Pending1", 1_700_000_000)
            .unwrap();
        assert!(view.is_self_record());
        assert_eq!(view.action_id, "1700000000?abcdef0123456789");
        assert_eq!(view.id, view.action_id);
    }

    #[test]
    fn confirmation_promotes_entities_and_drops_aliases() {
        let store = store();
        store.compose_action(
            create(EntityType::Forum, None, json!({ "title": "general" })),
            ALICE,
            3,
            1_700_000_000,
        );
        store
            .mark_submitted("Pending1", "abcdef0123456789", 1_700_000_000)
            .unwrap();

        let result = SubmissionResult {
            status: EntityStatus::Active,
            confirmed_action: Some(confirmed(
                "abcdef0123456789",
                create(EntityType::Forum, None, json!({ "title": "general" })),
                42,
                0,
            )),
        };
        let record = store
            .handle_submission_result("abcdef0123456789", result)
            .unwrap();
        assert_eq!(record.status, EntityStatus::Active);

        assert!(store.get_by_action_id("Pending1").is_none());
        assert!(store.get_by_action_id("abcdef0123456789").is_none());

        // The placeholder became a known entity with the confirmed
        // block fields baked into its id.
        let snapshot = store.snapshot();
        let forum = snapshot
            .known
            .values()
            .find(|e| e.entity_type == EntityType::Forum)
            .unwrap();
        assert_eq!(forum.status, EntityStatus::Active);
        assert!(forum.id.contains("abcdef0123456789"));
        assert!(snapshot.overlay().entities.is_empty());
    }

    #[test]
    fn rejection_drops_exclusive_entities_and_surfaces() {
        let store = store();
        store.compose_action(
            create(EntityType::Forum, None, json!({ "title": "doomed" })),
            ALICE,
            3,
            1_700_000_000,
        );
        store
            .mark_submitted("Pending1", "abcdef0123456789", 1_700_000_000)
            .unwrap();
        assert!(!store.snapshot().overlay().entities.is_empty());

        let err = store
            .handle_submission_result(
                "abcdef0123456789",
                SubmissionResult {
                    status: EntityStatus::Timeout,
                    confirmed_action: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, PendingError::ActionRejected { .. }));
        assert!(store.snapshot().overlay().entities.is_empty());
        assert!(store.get_by_action_id("Pending1").is_none());
    }

    #[test]
    fn dependents_regenerate_once_their_ancestor_confirms() {
        let store = store();

        // Topic composed under a confirmed forum.
        let codec = IdentityCodec::new();
        let forum_id = codec
            .postbox_id(
                EntityType::Forum,
                None,
                "ffffffffffffffff",
                &BlockOrder::new(1_600_000_000, 3, 100, 1),
            )
            .unwrap();
        store.compose_action(
            create(EntityType::Topic, Some(&forum_id), json!({ "title": "t" })),
            ALICE,
            3,
            1_700_000_000,
        );
        store
            .mark_submitted("Pending1", "abcdef0123456789", 1_700_000_000)
            .unwrap();

        // Post composed under the optimistic topic id.
        let snapshot = store.snapshot();
        let topic_placeholder = snapshot
            .overlay()
            .entities
            .values()
            .find(|e| e.entity_type == EntityType::Topic)
            .unwrap();
        let optimistic_topic_id = topic_placeholder.id.clone();
        store.compose_action(
            create(EntityType::Post, Some(&optimistic_topic_id), json!({ "body": "hi" })),
            ALICE,
            3,
            1_700_000_010,
        );

        // Topic confirms with real block fields.
        store
            .handle_submission_result(
                "abcdef0123456789",
                SubmissionResult {
                    status: EntityStatus::Active,
                    confirmed_action: Some(confirmed(
                        "abcdef0123456789",
                        create(EntityType::Topic, Some(&forum_id), json!({ "title": "t" })),
                        42,
                        3,
                    )),
                },
            )
            .unwrap();

        // The surviving post now hangs under the confirmed topic.
        let post = store.get_by_action_id("Pending2").unwrap();
        let parent = post.record.action.parent_id.unwrap();
        assert!(!parent.contains('?'));
        assert!(parent.contains("abcdef0123456789"));
        let synthesized_post = store
            .snapshot()
            .overlay()
            .entities
            .values()
            .find(|e| e.entity_type == EntityType::Post)
            .cloned()
            .unwrap();
        assert!(synthesized_post.id.starts_with(&parent));
    }

    #[test]
    fn pending_actions_iterate_in_session_order() {
        let store = store();
        store.compose_action(create(EntityType::Forum, None, json!({})), ALICE, 3, 1_700_000_000);
        store.compose_action(create(EntityType::Forum, None, json!({})), ALICE, 3, 1_700_000_000);
        let snapshot = store.snapshot();
        let records = snapshot.pending_actions();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action_id, "Pending1");
        assert_eq!(records[1].action_id, "Pending2");
    }

    #[test]
    fn unknown_alias_is_an_error() {
        let store = store();
        let err = store
            .handle_submission_result(
                "nope",
                SubmissionResult {
                    status: EntityStatus::Active,
                    confirmed_action: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, PendingError::UnknownAlias(_)));
    }
}
