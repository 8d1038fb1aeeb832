//! Threaded-hierarchy entities: Forum, Topic, Post, ProductTopic.
//! Votes live in the hierarchy too but have their own mutator.

use serde_json::{Map, Value};
use tracing::warn;
use tribune_actions::id_from_action;
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

fn applies(entity_type: EntityType) -> bool {
    matches!(
        entity_type,
        EntityType::Forum | EntityType::Topic | EntityType::Post | EntityType::ProductTopic
    )
}

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();
    let action = ctx.action();
    if !applies(action.entity_type) {
        return out;
    }

    match action.crud {
        Crud::Post => {
            let id = match id_from_action(ctx.codec, ctx.record) {
                Ok(id) => id,
                Err(err) => {
                    warn!(%err, "skipping postbox synthesis for malformed create");
                    return out;
                }
            };
            ctx.place(&mut out, &id, |ctx| {
                let mut entity =
                    ctx.placeholder(action.entity_type, &id, action.parent_id.clone());
                entity.fields = ctx.params_fields().into_iter().collect();
                entity.tags = ctx.params_tags();
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
