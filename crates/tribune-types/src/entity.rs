use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::EntityStatus;
use crate::error::TypeError;

/// The closed set of entity kinds the client understands.
///
/// Each kind carries a stable numeric code that is rendered as a hex
/// segment inside identifiers, so the codes can never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Forum,
    Topic,
    Post,
    ProductTopic,
    Vote,
    Admin,
    Count,
    CountUser,
    Profile,
    User,
    Wallet,
    WalletProxy,
    Pin,
    Notification,
    NotificationRead,
    Verification,
    VerifiedEntity,
    Action,
    Tag,
    TagLink,
    UserSettings,
}

/// Structural shape of an entity's identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdShape {
    /// Root entity keyed by its own creating-action id (and possibly
    /// other opaque bases), no structural parent.
    Parent,

    /// Many-relationship between two existing ids.
    Link,

    /// Member of the threaded Forum -> Topic -> Post hierarchy.
    Postbox,

    /// The action record itself; its id is the action id.
    BareAction,
}

impl EntityType {
    /// Stable numeric code embedded (as hex) in identifiers.
    pub fn code(&self) -> u32 {
        match self {
            EntityType::Forum => 1,
            EntityType::Topic => 2,
            EntityType::Post => 3,
            EntityType::ProductTopic => 4,
            EntityType::Vote => 5,
            EntityType::Admin => 6,
            EntityType::Count => 7,
            EntityType::CountUser => 8,
            EntityType::Profile => 9,
            EntityType::User => 10,
            EntityType::Wallet => 11,
            EntityType::WalletProxy => 12,
            EntityType::Pin => 13,
            EntityType::Notification => 14,
            EntityType::NotificationRead => 15,
            EntityType::Verification => 16,
            EntityType::VerifiedEntity => 17,
            EntityType::Action => 18,
            EntityType::Tag => 19,
            EntityType::TagLink => 20,
            EntityType::UserSettings => 21,
        }
    }

    /// Inverse of [`EntityType::code`].
    pub fn from_code(code: u32) -> Result<Self, TypeError> {
        match code {
            1 => Ok(EntityType::Forum),
            2 => Ok(EntityType::Topic),
            3 => Ok(EntityType::Post),
            4 => Ok(EntityType::ProductTopic),
            5 => Ok(EntityType::Vote),
            6 => Ok(EntityType::Admin),
            7 => Ok(EntityType::Count),
            8 => Ok(EntityType::CountUser),
            9 => Ok(EntityType::Profile),
            10 => Ok(EntityType::User),
            11 => Ok(EntityType::Wallet),
            12 => Ok(EntityType::WalletProxy),
            13 => Ok(EntityType::Pin),
            14 => Ok(EntityType::Notification),
            15 => Ok(EntityType::NotificationRead),
            16 => Ok(EntityType::Verification),
            17 => Ok(EntityType::VerifiedEntity),
            18 => Ok(EntityType::Action),
            19 => Ok(EntityType::Tag),
            20 => Ok(EntityType::TagLink),
            21 => Ok(EntityType::UserSettings),
            other => Err(TypeError::UnknownEntityType(other)),
        }
    }

    /// The hex rendering of the code, as it appears inside identifiers.
    pub fn code_hex(&self) -> String {
        format!("{:x}", self.code())
    }

    /// Parse the hex rendering back into a type.
    pub fn from_code_hex(hex: &str) -> Result<Self, TypeError> {
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| TypeError::UnknownEntityTypeName(hex.to_string()))?;
        Self::from_code(code)
    }

    /// Which identifier shape this kind uses.
    pub fn id_shape(&self) -> IdShape {
        match self {
            EntityType::Forum
            | EntityType::Topic
            | EntityType::Post
            | EntityType::ProductTopic
            | EntityType::Vote => IdShape::Postbox,

            EntityType::Admin
            | EntityType::Count
            | EntityType::CountUser
            | EntityType::Wallet
            | EntityType::WalletProxy
            | EntityType::Pin
            | EntityType::NotificationRead
            | EntityType::VerifiedEntity
            | EntityType::TagLink
            | EntityType::UserSettings => IdShape::Link,

            EntityType::Profile
            | EntityType::User
            | EntityType::Notification
            | EntityType::Verification
            | EntityType::Tag => IdShape::Parent,

            EntityType::Action => IdShape::BareAction,
        }
    }

    /// Whether this kind lives in the threaded hierarchy.
    pub fn is_postbox(&self) -> bool {
        self.id_shape() == IdShape::Postbox
    }

    /// Whether a segment of this kind resets the epoch for the
    /// block-order fields of every descendant segment below it.
    pub fn is_epoch_provider(&self) -> bool {
        matches!(self, EntityType::Topic | EntityType::ProductTopic)
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Forum => "forum",
            EntityType::Topic => "topic",
            EntityType::Post => "post",
            EntityType::ProductTopic => "productTopic",
            EntityType::Vote => "vote",
            EntityType::Admin => "admin",
            EntityType::Count => "count",
            EntityType::CountUser => "countUser",
            EntityType::Profile => "profile",
            EntityType::User => "user",
            EntityType::Wallet => "wallet",
            EntityType::WalletProxy => "walletProxy",
            EntityType::Pin => "pin",
            EntityType::Notification => "notification",
            EntityType::NotificationRead => "notificationRead",
            EntityType::Verification => "verification",
            EntityType::VerifiedEntity => "verifiedEntity",
            EntityType::Action => "action",
            EntityType::Tag => "tag",
            EntityType::TagLink => "tagLink",
            EntityType::UserSettings => "userSettings",
        };
        write!(f, "{}", name)
    }
}

/// The base JSON shape every server entity satisfies.
///
/// Type-specific fields (titles, vote values, counters, ...) ride in
/// `fields` untyped; the overlay engine reads and writes them by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityJson {
    /// Canonical entity id
    pub id: String,

    /// Id of the action that created this entity
    pub action_id: String,

    /// Packed block-order key for chronological sorting
    pub block_order: String,

    /// DID or address of the creator
    pub creator_id: String,

    /// Chain the creating action was submitted on
    pub chain_id: u16,

    /// Lifecycle status
    pub status: EntityStatus,

    /// Structural parent, when the entity has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Entity kind
    pub entity_type: EntityType,

    /// Type-specific fields
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl EntityJson {
    /// A placeholder entity with default field values, used by the
    /// overlay engine when synthesizing a not-yet-confirmed entity.
    pub fn placeholder(
        entity_type: EntityType,
        id: impl Into<String>,
        action_id: impl Into<String>,
        block_order: impl Into<String>,
        creator_id: impl Into<String>,
        chain_id: u16,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            action_id: action_id.into(),
            block_order: block_order.into(),
            creator_id: creator_id.into(),
            chain_id,
            status: EntityStatus::Pending,
            parent_id,
            tags: Vec::new(),
            entity_type,
            fields: BTreeMap::new(),
        }
    }

    /// Read a numeric field, treating absence as zero.
    pub fn counter(&self, name: &str) -> i64 {
        self.fields.get(name).and_then(Value::as_i64).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_codes_round_trip() {
        let all = [
            EntityType::Forum,
            EntityType::Topic,
            EntityType::Post,
            EntityType::ProductTopic,
            EntityType::Vote,
            EntityType::Admin,
            EntityType::Count,
            EntityType::CountUser,
            EntityType::Profile,
            EntityType::User,
            EntityType::Wallet,
            EntityType::WalletProxy,
            EntityType::Pin,
            EntityType::Notification,
            EntityType::NotificationRead,
            EntityType::Verification,
            EntityType::VerifiedEntity,
            EntityType::Action,
            EntityType::Tag,
            EntityType::TagLink,
            EntityType::UserSettings,
        ];
        for t in all {
            assert_eq!(EntityType::from_code(t.code()).unwrap(), t);
            assert_eq!(EntityType::from_code_hex(&t.code_hex()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_code_is_an_error() {
        assert!(EntityType::from_code(0).is_err());
        assert!(EntityType::from_code(999).is_err());
        assert!(EntityType::from_code_hex("zz").is_err());
    }

    #[test]
    fn entity_json_serde_round_trip() {
        let mut entity = EntityJson::placeholder(
            EntityType::Topic,
            "some-id",
            "abcdef0123456789",
            "0".repeat(32),
            "did:tribune:alice",
            3,
            Some("forum-id".to_string()),
        );
        entity.fields.insert("title".into(), Value::from("hello"));

        let json = serde_json::to_string(&entity).unwrap();
        let back: EntityJson = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
        assert!(json.contains("\"entityType\":\"topic\""));
    }

    #[test]
    fn counter_defaults_to_zero() {
        let entity = EntityJson::placeholder(
            EntityType::Count,
            "c",
            "a",
            "0".repeat(32),
            "did:tribune:alice",
            1,
            None,
        );
        assert_eq!(entity.counter("upVotes"), 0);
    }
}
