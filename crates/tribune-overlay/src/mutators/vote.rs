//! The Vote entity itself: one row per vote in the hierarchy, under
//! the entity it votes on.

use serde_json::{Map, Value};
use tracing::warn;
use tribune_actions::id_from_action;
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();
    let action = ctx.action();
    if action.entity_type != EntityType::Vote {
        return out;
    }

    let value = action.param_i64("value").unwrap_or(1);
    match action.crud {
        Crud::Post => {
            let id = match id_from_action(ctx.codec, ctx.record) {
                Ok(id) => id,
                Err(err) => {
                    warn!(%err, "skipping vote synthesis for malformed create");
                    return out;
                }
            };
            ctx.place(&mut out, &id, |ctx| {
                let mut entity = ctx.placeholder(EntityType::Vote, &id, action.parent_id.clone());
                entity.fields.insert("value".into(), Value::from(value));
                entity
            });
        }
        Crud::Put => {
            if let Some(target) = &action.crud_entity_id {
                let mut fields = Map::new();
                fields.insert("value".into(), Value::from(value));
                out.push_edit(
                    ctx.normalize(target),
                    EditEntry::with_fields(Crud::Put, fields),
                );
            }
        }
        Crud::Delete => {
            if let Some(target) = &action.crud_entity_id {
                let mut fields = Map::new();
                fields.insert("status".into(), Value::from("deleted"));
                out.push_edit(
                    ctx.normalize(target),
                    EditEntry::with_fields(Crud::Delete, fields),
                );
            }
        }
    }
    out
}
