//! User rows and their settings. Every create action implies its
//! author exists, so the author's User entity is synthesized whenever
//! it is not yet known; profile creation also back-links the new
//! profile onto the user.

use serde_json::{Map, Value};
use tracing::warn;
use tribune_actions::id_from_action;
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();
    let action = ctx.action();

    // The implied-author rule: any create means the creator is a user.
    if action.crud == Crud::Post {
        if let Ok(user_id) = ctx
            .codec
            .parent_id(EntityType::User, &[ctx.record.creator_id.as_str()])
        {
            ctx.place(&mut out, &user_id, |ctx| {
                ctx.placeholder(EntityType::User, &user_id, None)
            });

            if action.entity_type == EntityType::Profile {
                if let Ok(profile_id) = id_from_action(ctx.codec, ctx.record) {
                    let mut fields = Map::new();
                    fields.insert(
                        "profileId".into(),
                        Value::from(ctx.normalize(&profile_id)),
                    );
                    out.push_edit(
                        ctx.normalize(&user_id),
                        EditEntry::with_fields(Crud::Put, fields),
                    );
                }
            }
        }
    }

    match action.entity_type {
        EntityType::User => {
            if action.crud == Crud::Put {
                if let Some(target) = &action.crud_entity_id {
                    out.push_edit(
                        ctx.normalize(target),
                        EditEntry::with_fields(Crud::Put, ctx.params_fields()),
                    );
                }
            }
        }
        EntityType::UserSettings => match action.crud {
            Crud::Post => {
                let id = match id_from_action(ctx.codec, ctx.record) {
                    Ok(id) => id,
                    Err(err) => {
                        warn!(%err, "skipping settings synthesis for malformed create");
                        return out;
                    }
                };
                ctx.place(&mut out, &id, |ctx| {
                    let mut entity = ctx.placeholder(EntityType::UserSettings, &id, None);
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
            Crud::Delete => {}
        },
        _ => {}
    }
    out
}
