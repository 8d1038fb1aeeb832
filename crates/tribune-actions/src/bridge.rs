//! Deriving entity ids from actions, and upgrading ids once the actions
//! they were built on confirm.

use std::collections::HashMap;

use tracing::debug;
use tribune_identity::{ActionId, BlockOrder, IdentityCodec, ParsedId, SegmentSpec};
use tribune_types::{ActionRecord, Crud, EntityStatus, EntityType, IdShape};

use crate::error::{ActionError, ActionResult};

/// Canonical id of the entity an action creates or targets.
///
/// Edits and deletes return the existing `crud_entity_id`; creates
/// generate a fresh id from the action's identity fields.
pub fn id_from_action(codec: &IdentityCodec, record: &ActionRecord) -> ActionResult<String> {
    let action = &record.action;
    match action.crud {
        Crud::Put | Crud::Delete => action
            .crud_entity_id
            .clone()
            .ok_or_else(|| ActionError::MissingTarget(action.entity_type.to_string())),
        Crud::Post => match action.entity_type.id_shape() {
            IdShape::Postbox => {
                let order = BlockOrder::parse(&record.block_order, None)?.order;
                let parent = action.parent_id.as_deref();
                if parent.is_none() && action.entity_type != EntityType::Forum {
                    return Err(ActionError::MissingParent(action.entity_type.to_string()));
                }
                Ok(codec.postbox_id(action.entity_type, parent, &record.action_id, &order)?)
            }
            IdShape::Parent => {
                // Users are keyed by who they are; everything else by
                // the action that created it.
                let base = match action.entity_type {
                    EntityType::User => record.creator_id.as_str(),
                    _ => record.action_id.as_str(),
                };
                Ok(codec.parent_id(action.entity_type, &[base])?)
            }
            IdShape::Link => {
                let (to_many, one) = link_sides(record)?;
                Ok(codec.link_id(action.entity_type, &to_many, &one)?)
            }
            IdShape::BareAction => Ok(record.action_id.clone()),
        },
    }
}

/// The two sides of a link id derived from a create action.
fn link_sides(record: &ActionRecord) -> ActionResult<(String, String)> {
    let action = &record.action;
    let parent = || {
        action
            .parent_id
            .clone()
            .ok_or_else(|| ActionError::MissingParent(action.entity_type.to_string()))
    };
    let chain_hex = format!("{:x}", record.chain_id);

    let sides = match action.entity_type {
        // One count per chain per target
        EntityType::Count => (parent()?, chain_hex),
        // Grants and per-user relationship rows hang a user off a target
        EntityType::Admin | EntityType::TagLink => {
            let one = action
                .param_str("userId")
                .map(str::to_string)
                .unwrap_or_else(|| record.creator_id.clone());
            (parent()?, one)
        }
        // Wallets hang off their owning user
        EntityType::Wallet | EntityType::WalletProxy => {
            let address = action
                .param_str("address")
                .map(str::to_string)
                .unwrap_or_else(|| record.action_id.clone());
            (record.creator_id.clone(), address)
        }
        EntityType::UserSettings => (record.creator_id.clone(), chain_hex),
        // CountUser, Pin, NotificationRead, VerifiedEntity: the
        // creator's row under the target
        _ => (parent()?, record.creator_id.clone()),
    };
    Ok(sides)
}

/// Correlation key used before the server has assigned a real action
/// id, when the client knows only its own signed hash:
/// `targetId,chainIdHex,actionHash`.
pub fn composed_id_from_action(record: &ActionRecord) -> String {
    let target = record.action.target_id().unwrap_or_default();
    let hash = ActionId::parse(&record.action_id)
        .map(|a| a.normalized())
        .unwrap_or_else(|| record.action_id.clone());
    format!("{},{:x},{}", target, record.chain_id, hash)
}

/// Rewrite every segment of `id` whose action id is optimistic and
/// whose confirmed action is now known, regenerating the id with the
/// confirmed `{time, chainId, block, txn, actionId}`. Segments whose
/// action has not confirmed yet are left untouched and picked up on the
/// next reconciliation pass. Link and parent components are rewritten
/// recursively.
pub fn regenerate_id_with_action(
    codec: &IdentityCodec,
    id: &str,
    confirmed_by_id: &HashMap<String, ActionRecord>,
) -> String {
    match &*codec.parse(id) {
        ParsedId::Postbox(depths) => {
            let mut changed = false;
            let specs: Vec<SegmentSpec> = depths
                .iter()
                .map(|depth| {
                    let segment = &depth.segment;
                    if !segment.action_id.is_optimistic() {
                        return segment.into();
                    }
                    match lookup(confirmed_by_id, &segment.action_id) {
                        Some((real_id, order)) => {
                            changed = true;
                            SegmentSpec {
                                entity_type: segment.entity_type,
                                block_order: order,
                                action_id: real_id,
                            }
                        }
                        None => segment.into(),
                    }
                })
                .collect();
            if !changed {
                return id.to_string();
            }
            let regenerated = codec.render_postbox_id(&specs);
            debug!(id, regenerated, "regenerated postbox id");
            regenerated
        }
        ParsedId::Link {
            to_many,
            one,
            entity_type,
        } => {
            let to_many = regenerate_id_with_action(codec, to_many, confirmed_by_id);
            let one = regenerate_id_with_action(codec, one, confirmed_by_id);
            format!("{}+{}:{}", to_many, one, entity_type.code_hex())
        }
        ParsedId::Parent { bases, entity_type } => {
            let bases: Vec<String> = bases
                .iter()
                .map(|base| match ActionId::parse(base) {
                    Some(action) if action.is_optimistic() => {
                        match lookup(confirmed_by_id, &action) {
                            Some((real_id, _)) => real_id,
                            None => base.clone(),
                        }
                    }
                    _ => base.clone(),
                })
                .collect();
            format!("{}:{}", bases.join(","), entity_type.code_hex())
        }
        ParsedId::Action(action) if action.is_optimistic() => {
            match lookup(confirmed_by_id, action) {
                Some((real_id, _)) => real_id,
                None => id.to_string(),
            }
        }
        _ => id.to_string(),
    }
}

/// Find the confirmed record for an optimistic action id, trying every
/// alias the caller might have keyed it by.
fn lookup(
    confirmed_by_id: &HashMap<String, ActionRecord>,
    action_id: &ActionId,
) -> Option<(String, BlockOrder)> {
    let record = confirmed_by_id
        .get(&action_id.to_string())
        .or_else(|| confirmed_by_id.get(&action_id.normalized()))?;
    if record.status != EntityStatus::Active && record.status != EntityStatus::Deleted {
        return None;
    }
    let order = BlockOrder::parse(&record.block_order, None).ok()?.order;
    Some((record.action_id.clone(), order))
}
