//! Parsed identifier shapes.
//!
//! An identifier string is one of four unrelated shapes. The codec
//! decomposes it exactly once into this tagged union so downstream code
//! matches exhaustively instead of re-sniffing strings.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use tribune_types::EntityType;

use crate::block_order::BlockOrder;

/// Character set action-id hashes are drawn from, in lexicographic
/// order. Successor computation depends on this ordering.
pub const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a confirmed action-id hash.
pub const ACTION_HASH_LEN: usize = 16;

/// An action identifier in any of its lifecycle forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionId {
    /// Server-confirmed 16-character hash
    Confirmed(String),

    /// Client-known hash with the submission timestamp still attached,
    /// rendered `{unixTimestamp}?{hash}`
    Optimistic { timestamp: u64, hash: String },

    /// Bare counter token `Pending{n}`, used before any hash exists
    Local(u64),
}

impl ActionId {
    /// Parse any of the three forms. Returns `None` for strings that
    /// are not action ids at all.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(counter) = s.strip_prefix("Pending") {
            return counter.parse::<u64>().ok().map(ActionId::Local);
        }
        if let Some((timestamp, hash)) = s.split_once('?') {
            let timestamp = timestamp.parse::<u64>().ok()?;
            if is_action_hash(hash) {
                return Some(ActionId::Optimistic {
                    timestamp,
                    hash: hash.to_string(),
                });
            }
            return None;
        }
        if is_action_hash(s) {
            return Some(ActionId::Confirmed(s.to_string()));
        }
        None
    }

    /// Whether this id is still awaiting confirmation.
    pub fn is_optimistic(&self) -> bool {
        !matches!(self, ActionId::Confirmed(_))
    }

    /// The hash portion, when one exists.
    pub fn hash(&self) -> Option<&str> {
        match self {
            ActionId::Confirmed(hash) => Some(hash),
            ActionId::Optimistic { hash, .. } => Some(hash),
            ActionId::Local(_) => None,
        }
    }

    /// The stable form used as a join key across the pending ->
    /// confirmed transition: the timestamp prefix is dropped, local
    /// counters stay as-is.
    pub fn normalized(&self) -> String {
        match self {
            ActionId::Confirmed(hash) => hash.clone(),
            ActionId::Optimistic { hash, .. } => hash.clone(),
            ActionId::Local(n) => format!("Pending{}", n),
        }
    }
}

impl Display for ActionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::Confirmed(hash) => write!(f, "{}", hash),
            ActionId::Optimistic { timestamp, hash } => write!(f, "{}?{}", timestamp, hash),
            ActionId::Local(n) => write!(f, "Pending{}", n),
        }
    }
}

fn is_action_hash(s: &str) -> bool {
    s.len() == ACTION_HASH_LEN && s.bytes().all(|b| ID_ALPHABET.contains(&b))
}

/// One depth of a postbox (hierarchical) identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostboxSegment {
    pub entity_type: EntityType,

    /// Absolute ordering tuple, with any epoch offsets re-added
    pub block_order: BlockOrder,

    /// The block-order hex exactly as written in the id
    pub packed_block_order: String,

    pub action_id: ActionId,
}

/// Per-depth descriptor returned by postbox parsing. Each depth carries
/// the full id prefix and the cumulative ancestor action-id set, so any
/// depth's ancestry is recoverable without re-parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostboxDepth {
    /// Full identifier up to and including this segment
    pub id: String,

    pub segment: PostboxSegment,

    /// Every action id (raw and normalized form) appearing in this
    /// depth's segment or any segment above it
    pub ancestor_action_ids: HashSet<String>,
}

/// A decomposed identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedId {
    /// `base1,base2,...:typeHex`: root entity keyed by opaque bases
    Parent {
        bases: Vec<String>,
        entity_type: EntityType,
    },

    /// `toManyId+oneId:typeHex`: a many-relationship
    Link {
        to_many: String,
        one: String,
        entity_type: EntityType,
    },

    /// `&`-joined hierarchy, ordered root first
    Postbox(Vec<PostboxDepth>),

    /// A bare action id
    Action(ActionId),

    /// Not an entity id (DID, wallet address, garbage). Never an error.
    Unknown(String),
}

impl ParsedId {
    /// The entity kind, when the id names one.
    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            ParsedId::Parent { entity_type, .. } | ParsedId::Link { entity_type, .. } => {
                Some(*entity_type)
            }
            ParsedId::Postbox(depths) => depths.last().map(|d| d.segment.entity_type),
            ParsedId::Action(_) => Some(EntityType::Action),
            ParsedId::Unknown(_) => None,
        }
    }

    /// The postbox depths, when the id is hierarchical.
    pub fn postbox(&self) -> Option<&[PostboxDepth]> {
        match self {
            ParsedId::Postbox(depths) => Some(depths),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_id_forms_parse_and_display() {
        let confirmed = ActionId::parse("abcdef0123456789").unwrap();
        assert_eq!(confirmed, ActionId::Confirmed("abcdef0123456789".into()));
        assert!(!confirmed.is_optimistic());
        assert_eq!(confirmed.to_string(), "abcdef0123456789");

        let optimistic = ActionId::parse("1700000000?abcdef0123456789").unwrap();
        assert!(optimistic.is_optimistic());
        assert_eq!(optimistic.to_string(), "1700000000?abcdef0123456789");
        assert_eq!(optimistic.normalized(), "abcdef0123456789");

        let local = ActionId::parse("Pending42").unwrap();
        assert_eq!(local, ActionId::Local(42));
        assert!(local.is_optimistic());
        assert_eq!(local.normalized(), "Pending42");
    }

    #[test]
    fn non_action_strings_do_not_parse() {
        assert_eq!(ActionId::parse("did:tribune:alice"), None);
        assert_eq!(ActionId::parse("short"), None);
        assert_eq!(ActionId::parse("UPPERCASE0123456"), None);
        assert_eq!(ActionId::parse("notatimestamp?abcdef0123456789"), None);
        assert_eq!(ActionId::parse("PendingXYZ"), None);
    }

    #[test]
    fn normalization_drops_the_timestamp_prefix_only() {
        let optimistic = ActionId::Optimistic {
            timestamp: 1_700_000_000,
            hash: "abcdef0123456789".into(),
        };
        let confirmed = ActionId::Confirmed("abcdef0123456789".into());
        assert_eq!(optimistic.normalized(), confirmed.normalized());
    }
}
