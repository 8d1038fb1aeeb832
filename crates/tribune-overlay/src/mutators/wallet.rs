//! Wallet and wallet-proxy rows, keyed under their owner. Linking a
//! primary wallet also surfaces it on the user row.

use serde_json::{Map, Value};
use tracing::warn;
use tribune_actions::id_from_action;
use tribune_types::{Crud, EntityType};

use crate::engine::MutatorCtx;
use crate::output::{EditEntry, OverlayOutput};

pub fn apply(ctx: &MutatorCtx<'_>) -> OverlayOutput {
    let mut out = OverlayOutput::new();
    let action = ctx.action();
    if !matches!(
        action.entity_type,
        EntityType::Wallet | EntityType::WalletProxy
    ) {
        return out;
    }

    match action.crud {
        Crud::Post => {
            let id = match id_from_action(ctx.codec, ctx.record) {
                Ok(id) => id,
                Err(err) => {
                    warn!(%err, "skipping wallet synthesis for malformed create");
                    return out;
                }
            };
            ctx.place(&mut out, &id, |ctx| {
                let mut entity = ctx.placeholder(action.entity_type, &id, None);
                if let Some(address) = action.param_str("address") {
                    entity
                        .fields
                        .insert("address".into(), Value::from(address.to_string()));
                }
                entity
            });

            if action.entity_type == EntityType::Wallet {
                if let Ok(user_id) = ctx
                    .codec
                    .parent_id(EntityType::User, &[ctx.record.creator_id.as_str()])
                {
                    let mut fields = Map::new();
                    fields.insert("walletId".into(), Value::from(ctx.normalize(&id)));
                    out.push_edit(
                        ctx.normalize(&user_id),
                        EditEntry::with_fields(Crud::Put, fields),
                    );
                }
            }
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
