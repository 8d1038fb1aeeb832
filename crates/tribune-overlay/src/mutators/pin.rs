//! Pins: a per-user pin row plus a `pinned` flag surfaced on the
//! pinned target itself.

use serde_json::{Map, Value};
use tracing::warn;
use tribune_actions::id_from_action;
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();
    let action = ctx.action();
    if action.entity_type != EntityType::Pin {
        return out;
    }

    match action.crud {
        Crud::Post => {
            let Some(target) = action.parent_id.clone() else {
                return out;
            };
            let id = match id_from_action(ctx.codec, ctx.record) {
                Ok(id) => id,
                Err(err) => {
                    warn!(%err, "skipping pin synthesis for malformed create");
                    return out;
                }
            };
            ctx.place(&mut out, &id, |ctx| {
                ctx.placeholder(EntityType::Pin, &id, Some(target.clone()))
            });

            let mut fields = Map::new();
            fields.insert("pinned".into(), Value::from(true));
            out.push_edit(
                ctx.normalize(&target),
                EditEntry::with_fields(Crud::Put, fields),
            );
        }
        Crud::Delete => {
            let Some(pin_id) = action.crud_entity_id.as_deref() else {
                return out;
            };
            let mut fields = Map::new();
            fields.insert("status".into(), Value::from("deleted"));
            out.push_edit(
                ctx.normalize(pin_id),
                EditEntry::with_fields(Crud::Delete, fields),
            );

            if let Some(target) = ctx.codec.get_parent_id_from_id(pin_id) {
                let mut fields = Map::new();
                fields.insert("pinned".into(), Value::from(false));
                out.push_edit(
                    ctx.normalize(&target),
                    EditEntry::with_fields(Crud::Put, fields),
                );
            }
        }
        Crud::Put => {}
    }
    out
}
