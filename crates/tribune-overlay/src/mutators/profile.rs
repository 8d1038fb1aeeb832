//! Profile entities: display name, avatar and the rest of a user's
//! public card.

use serde_json::{Map, Value};
use tracing::warn;
use tribune_actions::id_from_action;
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();
    let action = ctx.action();
    if action.entity_type != EntityType::Profile {
        return out;
    }

    match action.crud {
        Crud::Post => {
            let id = match id_from_action(ctx.codec, ctx.record) {
                Ok(id) => id,
                Err(err) => {
                    warn!(%err, "skipping profile synthesis for malformed create");
                    return out;
                }
            };
            ctx.place(&mut out, &id, |ctx| {
                let mut entity =
                    ctx.placeholder(EntityType::Profile, &id, action.parent_id.clone());
                entity.fields.extend(ctx.params_fields());
                entity
            });
        }
        Crud::Put => {
            if let Some(target) = &action.crud_entity_id {
                out.push_edit(
                    ctx.normalize(target),
                    EditEntry::with_fields(Crud::Put, ctx.params_fields()),
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
