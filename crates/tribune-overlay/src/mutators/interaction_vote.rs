//! CountUser rows: the current user's own vote state on a target,
//! separate from the aggregate counters so the UI can highlight what
//! this user did without waiting for confirmation.

use serde_json::{Map, Value};
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();
    let action = ctx.action();
    if action.entity_type != EntityType::Vote {
        return out;
    }

    let target = match action.crud {
        Crud::Post => action.parent_id.clone(),
        Crud::Put | Crud::Delete => action
            .crud_entity_id
            .as_deref()
            .and_then(|vote_id| ctx.codec.get_parent_id_from_id(vote_id)),
    };
    let Some(target) = target else {
        return out;
    };

    let Ok(count_user_id) =
        ctx.codec
            .link_id(EntityType::CountUser, &target, &ctx.record.creator_id)
    else {
        return out;
    };

    ctx.place(&mut out, &count_user_id, |ctx| {
        let mut entity =
            ctx.placeholder(EntityType::CountUser, &count_user_id, Some(target.clone()));
        entity.fields.insert("vote".into(), Value::from(0));
        entity
    });

    let vote = match action.crud {
        Crud::Delete => 0,
        _ => action.param_i64("value").unwrap_or(1),
    };
    let mut fields = Map::new();
    fields.insert("vote".into(), Value::from(vote));
    out.push_edit(
        ctx.normalize(&count_user_id),
        EditEntry::with_fields(Crud::Put, fields),
    );
    out
}
