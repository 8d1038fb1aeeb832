//! Pending-side identity: the aliases and provisional block orders an
//! action carries between composition and confirmation.

use chrono::Utc;
use tribune_identity::{ActionId, BlockOrder, IdentityCodec};
use tribune_types::{ActionRecord, EntityStatus};

use crate::bridge::id_from_action;
use crate::error::ActionResult;

/// Optimistic action id: the submission timestamp stays recoverable
/// until the server confirms.
pub fn optimistic_action_id(timestamp: u64, hash: &str) -> String {
    format!("{}?{}", timestamp, hash)
}

/// Bare counter alias used before any signed hash exists.
pub fn local_action_id(counter: u64) -> String {
    format!("Pending{}", counter)
}

/// Current unix time, the compose-side timestamp source.
pub fn now_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Provisional block order for a composed action: the block is unknown,
/// so only the timestamp and chain sort it.
pub fn pending_block_order(timestamp: u64, chain_id: u16) -> BlockOrder {
    BlockOrder::new(timestamp, chain_id, 0, 0)
}

/// Local variant carrying a per-session sequence number in the block
/// field, so actions composed within the same second keep a stable
/// relative order.
pub fn local_pending_block_order(timestamp: u64, chain_id: u16, sequence: u64) -> BlockOrder {
    BlockOrder::new(timestamp, chain_id, sequence, 0)
}

/// The action rewritten to its pending alias and pending block order:
/// the "what would this look like right now" view UI getters read
/// before confirmation.
pub fn pending_action_json(
    codec: &IdentityCodec,
    record: &ActionRecord,
    timestamp: u64,
) -> ActionResult<ActionRecord> {
    let alias = record
        .pending_id
        .clone()
        .unwrap_or_else(|| match ActionId::parse(&record.action_id) {
            Some(ActionId::Confirmed(hash)) => optimistic_action_id(timestamp, &hash),
            _ => record.action_id.clone(),
        });

    let was_self = record.is_self_record();
    let mut pending = ActionRecord {
        id: record.id.clone(),
        action_id: alias.clone(),
        // Derived records keep their own pending id, if any; aliasing
        // action_id == pending_id would misclassify them as self
        // records.
        pending_id: if was_self {
            Some(alias.clone())
        } else {
            record.pending_id.clone()
        },
        action: record.action.clone(),
        chain_id: record.chain_id,
        creator_id: record.creator_id.clone(),
        block_order: pending_block_order(timestamp, record.chain_id).pack(None),
        status: EntityStatus::Pending,
    };
    pending.id = if was_self {
        alias
    } else {
        id_from_action(codec, &pending)?
    };
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tribune_types::{ActionJson, Crud, EntityType};

    #[test]
    fn alias_forms() {
        assert_eq!(local_action_id(7), "Pending7");
        assert_eq!(
            optimistic_action_id(1_700_000_000, "abcdef0123456789"),
            "1700000000?abcdef0123456789"
        );
        assert!(ActionId::parse(&local_action_id(7)).unwrap().is_optimistic());
    }

    #[test]
    fn local_order_sorts_by_sequence_within_a_second() {
        let a = local_pending_block_order(1_700_000_000, 1, 1).pack(None);
        let b = local_pending_block_order(1_700_000_000, 1, 2).pack(None);
        assert!(a < b);
    }

    #[test]
    fn pending_rewrite_keeps_the_self_record_invariant() {
        let codec = IdentityCodec::new();
        let record = ActionRecord {
            id: "abcdef0123456789".to_string(),
            action_id: "abcdef0123456789".to_string(),
            pending_id: None,
            action: ActionJson {
                crud: Crud::Post,
                entity_type: EntityType::Forum,
                parent_id: None,
                crud_entity_id: None,
                params: json!({"title": "hello"}),
            },
            chain_id: 3,
            creator_id: "did:tribune:alice".to_string(),
            block_order: BlockOrder::new(1_700_000_000, 3, 0, 0).pack(None),
            status: EntityStatus::Pending,
        };

        let pending = pending_action_json(&codec, &record, 1_700_000_000).unwrap();
        assert!(pending.is_self_record());
        assert_eq!(pending.action_id, "1700000000?abcdef0123456789");
        assert_eq!(pending.status, EntityStatus::Pending);
        assert_eq!(
            pending.block_order,
            pending_block_order(1_700_000_000, 3).pack(None)
        );
    }

    #[test]
    fn pending_rewrite_regenerates_derived_ids() {
        let codec = IdentityCodec::new();
        let record = ActionRecord {
            id: "something-else".to_string(),
            action_id: "abcdef0123456789".to_string(),
            pending_id: None,
            action: ActionJson {
                crud: Crud::Post,
                entity_type: EntityType::Forum,
                parent_id: None,
                crud_entity_id: None,
                params: json!({}),
            },
            chain_id: 3,
            creator_id: "did:tribune:alice".to_string(),
            block_order: BlockOrder::new(1_700_000_000, 3, 5, 1).pack(None),
            status: EntityStatus::Pending,
        };

        let pending = pending_action_json(&codec, &record, 1_700_000_000).unwrap();
        assert!(!pending.is_self_record());
        // The derived id embeds the pending alias.
        assert!(pending.id.contains("1700000000?abcdef0123456789"));
    }
}
