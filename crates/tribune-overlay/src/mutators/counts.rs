//! Count entities: per-chain, per-target counters.
//!
//! A create or delete moves two different kinds of counter, keyed by
//! two different ids:
//!
//! - a non-vote create/delete changes its *parent's* child counters
//!   ([`increment_parent_count_params`], keyed parent-of-target);
//! - a vote create/delete changes the vote *target's* own interaction
//!   counters ([`increment_count_params`], keyed target-of-vote).
//!
//! The two are kept as independent functions because they compose
//! additively when both land on the same count id in one batch.

use serde_json::{Map, Value};
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

/// Child-counter delta on the parent of a non-vote postbox target.
/// Returns the id whose Count moves, plus the field delta.
pub fn increment_parent_count_params(ctx: &MutatorCtx<'_>) -> Option<(String, Map<String, Value>)> {
    let action = ctx.action();
    if action.entity_type == EntityType::Vote || !action.entity_type.is_postbox() {
        return None;
    }

    let (parent, delta) = match action.crud {
        Crud::Post => (action.parent_id.clone()?, 1),
        Crud::Delete => {
            let target = action.crud_entity_id.as_deref()?;
            (ctx.codec.get_parent_id_from_id(target)?, -1)
        }
        Crud::Put => return None,
    };

    let field = match action.entity_type {
        EntityType::Topic | EntityType::ProductTopic => "topicCount",
        _ => "postCount",
    };
    let mut fields = Map::new();
    fields.insert(field.to_string(), Value::from(delta));
    Some((parent, fields))
}

/// Up/down-vote delta on the target of a vote.
pub fn increment_count_params(ctx: &MutatorCtx<'_>) -> Option<(String, Map<String, Value>)> {
    let action = ctx.action();
    if action.entity_type != EntityType::Vote {
        return None;
    }

    let (target, value, delta) = match action.crud {
        Crud::Post => (
            action.parent_id.clone()?,
            action.param_i64("value").unwrap_or(1),
            1,
        ),
        Crud::Delete => {
            // A delete carries no payload; the direction to reverse
            // lives on the vote row itself.
            let vote_id = action.crud_entity_id.as_deref()?;
            let value = ctx
                .known_entity(vote_id)
                .and_then(|vote| vote.fields.get("value").and_then(Value::as_i64))
                .or_else(|| action.param_i64("value"))
                .unwrap_or(1);
            (ctx.codec.get_parent_id_from_id(vote_id)?, value, -1)
        }
        Crud::Put => return None,
    };

    let field = if value > 0 { "upVotes" } else { "downVotes" };
    let mut fields = Map::new();
    fields.insert(field.to_string(), Value::from(delta));
    Some((target, fields))
}

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();

    let increments = [
        increment_parent_count_params(ctx),
        increment_count_params(ctx),
    ];
    for (target, fields) in increments.into_iter().flatten() {
        let Ok(count_id) = ctx.codec.link_id(
            EntityType::Count,
            &target,
            &format!("{:x}", ctx.record.chain_id),
        ) else {
            continue;
        };
        ctx.place(&mut out, &count_id, |ctx| {
            ctx.placeholder(EntityType::Count, &count_id, Some(target.clone()))
        });
        out.push_edit(
            ctx.normalize(&count_id),
            EditEntry::with_fields(Crud::Put, fields),
        );
    }
    out
}
