//! Identifier generation, memoized parsing, and the derived queries the
//! rest of the client leans on.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, RwLock};

use lru::LruCache;
use tracing::debug;
use tribune_types::{EntityType, IdShape};

use crate::block_order::BlockOrder;
use crate::error::{IdentityError, IdentityResult};
use crate::parsed::{ActionId, ParsedId, PostboxDepth, PostboxSegment, ID_ALPHABET};

/// Separator between postbox segments.
const SEGMENT_SEP: char = '&';

/// Separator between fields inside a segment and between parent bases.
const FIELD_SEP: char = ',';

/// Separator between a link's two sides.
const LINK_SEP: char = '+';

/// Separator before the trailing type code.
const TYPE_SEP: char = ':';

/// Arguments for unified id generation, one variant per shape.
#[derive(Debug, Clone)]
pub enum IdParts<'a> {
    Parent {
        bases: &'a [&'a str],
    },
    Link {
        to_many: &'a str,
        one: &'a str,
    },
    Postbox {
        parent_id: Option<&'a str>,
        action_id: &'a str,
        block_order: BlockOrder,
    },
}

/// Minimal segment description used when (re)building a postbox id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpec {
    pub entity_type: EntityType,
    pub block_order: BlockOrder,
    pub action_id: String,
}

impl From<&PostboxSegment> for SegmentSpec {
    fn from(segment: &PostboxSegment) -> Self {
        Self {
            entity_type: segment.entity_type,
            block_order: segment.block_order,
            action_id: segment.action_id.to_string(),
        }
    }
}

/// Statistics for the parse memo cache
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub insertions: usize,
}

impl CacheStats {
    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// The identifier codec.
///
/// Each instance owns its parse memo table; the composing application
/// decides how widely to share one. Parsing is a pure function, so a
/// racing duplicate population writes an equal value and is only wasted
/// work, never a correctness problem.
pub struct IdentityCodec {
    cache: RwLock<LruCache<String, Arc<ParsedId>>>,
    stats: Mutex<CacheStats>,
}

impl Default for IdentityCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityCodec {
    /// Codec with the default memo capacity.
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = std::cmp::max(1, capacity);
        Self {
            cache: RwLock::new(LruCache::new(NonZeroUsize::new(capacity).unwrap())),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Memo-cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().unwrap().clone()
    }

    // ---- generation ------------------------------------------------

    /// Generate an id for any shape, dispatching on the entity type.
    pub fn generate(&self, entity_type: EntityType, parts: IdParts<'_>) -> IdentityResult<String> {
        match parts {
            IdParts::Parent { bases } => self.parent_id(entity_type, bases),
            IdParts::Link { to_many, one } => self.link_id(entity_type, to_many, one),
            IdParts::Postbox {
                parent_id,
                action_id,
                block_order,
            } => self.postbox_id(entity_type, parent_id, action_id, &block_order),
        }
    }

    /// `base1,base2,...:typeHex`. Bases are atomic tokens (action ids,
    /// DIDs, addresses) and must not contain structural separators.
    pub fn parent_id(&self, entity_type: EntityType, bases: &[&str]) -> IdentityResult<String> {
        check_shape(entity_type, IdShape::Parent, "parent")?;
        Ok(format!(
            "{}{}{}",
            bases.join(&FIELD_SEP.to_string()),
            TYPE_SEP,
            entity_type.code_hex()
        ))
    }

    /// `toManyId+oneId:typeHex`.
    pub fn link_id(&self, entity_type: EntityType, to_many: &str, one: &str) -> IdentityResult<String> {
        check_shape(entity_type, IdShape::Link, "link")?;
        Ok(format!(
            "{}{}{}{}{}",
            to_many,
            LINK_SEP,
            one,
            TYPE_SEP,
            entity_type.code_hex()
        ))
    }

    /// Append a postbox segment under `parent_id` (or start a Forum
    /// root when there is none). Descendants below a Topic encode their
    /// block-order fields against the Topic's block order.
    pub fn postbox_id(
        &self,
        entity_type: EntityType,
        parent_id: Option<&str>,
        action_id: &str,
        block_order: &BlockOrder,
    ) -> IdentityResult<String> {
        check_shape(entity_type, IdShape::Postbox, "postbox")?;

        let Some(parent_id) = parent_id else {
            if entity_type != EntityType::Forum {
                return Err(IdentityError::MissingParent(entity_type.to_string()));
            }
            // Forum root: field order reversed (fixed sharding convention)
            return Ok(format!(
                "{}{sep}{}{sep}{}",
                action_id,
                block_order.pack(None),
                entity_type.code_hex(),
                sep = FIELD_SEP,
            ));
        };

        if entity_type == EntityType::Forum {
            return Err(IdentityError::UnexpectedParent);
        }

        let parsed = self.parse(parent_id);
        let Some(depths) = parsed.postbox() else {
            return Err(IdentityError::MalformedParent(parent_id.to_string()));
        };

        // Epoch: the first epoch-providing ancestor, unless this
        // segment provides one itself (it then packs at full width).
        let epoch = if entity_type.is_epoch_provider() {
            None
        } else {
            depths
                .iter()
                .find(|d| d.segment.entity_type.is_epoch_provider())
                .map(|d| d.segment.block_order)
        };

        Ok(format!(
            "{}{}{}{sep}{}{sep}{}",
            parent_id,
            SEGMENT_SEP,
            entity_type.code_hex(),
            block_order.pack(epoch.as_ref()),
            action_id,
            sep = FIELD_SEP,
        ))
    }

    /// Rebuild a postbox id from absolute segment descriptions,
    /// recomputing epoch compression while walking. Used by id
    /// regeneration and normalization.
    pub fn render_postbox_id(&self, segments: &[SegmentSpec]) -> String {
        let mut out = String::new();
        let mut epoch: Option<BlockOrder> = None;
        for (depth, spec) in segments.iter().enumerate() {
            if depth == 0 {
                out.push_str(&format!(
                    "{}{sep}{}{sep}{}",
                    spec.action_id,
                    spec.block_order.pack(None),
                    spec.entity_type.code_hex(),
                    sep = FIELD_SEP,
                ));
            } else {
                let packed = if spec.entity_type.is_epoch_provider() {
                    spec.block_order.pack(None)
                } else {
                    spec.block_order.pack(epoch.as_ref())
                };
                out.push(SEGMENT_SEP);
                out.push_str(&format!(
                    "{}{sep}{}{sep}{}",
                    spec.entity_type.code_hex(),
                    packed,
                    spec.action_id,
                    sep = FIELD_SEP,
                ));
            }
            if spec.entity_type.is_epoch_provider() && epoch.is_none() {
                epoch = Some(spec.block_order);
            }
        }
        out
    }

    // ---- parsing ---------------------------------------------------

    /// Decompose an identifier, memoized by the raw string.
    pub fn parse(&self, id: &str) -> Arc<ParsedId> {
        {
            // get, not peek: a hit must refresh recency or the LRU
            // degrades to insertion-order eviction.
            let mut cache = self.cache.write().unwrap();
            if let Some(hit) = cache.get(id) {
                self.stats.lock().unwrap().hits += 1;
                return hit.clone();
            }
        }

        self.stats.lock().unwrap().misses += 1;
        let parsed = Arc::new(parse_uncached(id));

        let mut cache = self.cache.write().unwrap();
        cache.put(id.to_string(), parsed.clone());
        self.stats.lock().unwrap().insertions += 1;
        parsed
    }

    // ---- derived queries -------------------------------------------

    /// Entity kind named by an id, if any.
    pub fn get_type_from_id(&self, id: &str) -> Option<EntityType> {
        self.parse(id).entity_type()
    }

    /// One structural level up: the enclosing postbox prefix, or a
    /// link's many-side. Roots and non-entities have no parent.
    pub fn get_parent_id_from_id(&self, id: &str) -> Option<String> {
        match &*self.parse(id) {
            ParsedId::Postbox(depths) if depths.len() >= 2 => {
                Some(depths[depths.len() - 2].id.clone())
            }
            ParsedId::Link { to_many, .. } => Some(to_many.clone()),
            _ => None,
        }
    }

    /// Nearest ancestor (or self) of the given type inside a postbox id.
    pub fn postbox_ancestor_of_type(&self, id: &str, entity_type: EntityType) -> Option<String> {
        self.parse(id).postbox().and_then(|depths| {
            depths
                .iter()
                .find(|d| d.segment.entity_type == entity_type)
                .map(|d| d.id.clone())
        })
    }

    /// The Forum prefix of a postbox id.
    pub fn get_postbox_forum_id(&self, id: &str) -> Option<String> {
        self.postbox_ancestor_of_type(id, EntityType::Forum)
    }

    /// The nearest topic-like prefix (Topic or ProductTopic).
    pub fn get_postbox_topic_id(&self, id: &str) -> Option<String> {
        self.parse(id).postbox().and_then(|depths| {
            depths
                .iter()
                .find(|d| d.segment.entity_type.is_epoch_provider())
                .map(|d| d.id.clone())
        })
    }

    /// Depth of a postbox id (1 for a Forum root).
    pub fn postbox_depth(&self, id: &str) -> Option<usize> {
        self.parse(id).postbox().map(<[_]>::len)
    }

    /// Whether `action_id` (in any lifecycle form) appears in any
    /// segment of `id`. O(1) against the memoized ancestor set.
    pub fn has_ancestor_action_id(&self, id: &str, action_id: &str) -> bool {
        let parsed = self.parse(id);
        let Some(last) = parsed.postbox().and_then(<[_]>::last) else {
            return false;
        };
        if last.ancestor_action_ids.contains(action_id) {
            return true;
        }
        // An optimistic query form should also match its bare hash.
        ActionId::parse(action_id)
            .map(|a| last.ancestor_action_ids.contains(&a.normalized()))
            .unwrap_or(false)
    }

    /// Zero every block-order field and drop optimistic timestamp
    /// prefixes, yielding the stable join key that survives the
    /// pending -> confirmed transition. Idempotent; unknown ids pass
    /// through unchanged.
    pub fn normalize_id(&self, id: &str) -> String {
        match &*self.parse(id) {
            ParsedId::Parent { bases, entity_type } => {
                let bases: Vec<String> = bases
                    .iter()
                    .map(|b| match ActionId::parse(b) {
                        Some(action) => action.normalized(),
                        None => b.clone(),
                    })
                    .collect();
                format!(
                    "{}{}{}",
                    bases.join(&FIELD_SEP.to_string()),
                    TYPE_SEP,
                    entity_type.code_hex()
                )
            }
            ParsedId::Link {
                to_many,
                one,
                entity_type,
            } => format!(
                "{}{}{}{}{}",
                self.normalize_id(to_many),
                LINK_SEP,
                self.normalize_id(one),
                TYPE_SEP,
                entity_type.code_hex()
            ),
            ParsedId::Postbox(depths) => {
                let specs: Vec<SegmentSpec> = depths
                    .iter()
                    .map(|d| SegmentSpec {
                        entity_type: d.segment.entity_type,
                        block_order: BlockOrder::zero(),
                        action_id: d.segment.action_id.normalized(),
                    })
                    .collect();
                self.render_postbox_id(&specs)
            }
            ParsedId::Action(action) => action.normalized(),
            ParsedId::Unknown(raw) => raw.clone(),
        }
    }

    /// Lexicographic successor of a postbox id, used as an exclusive
    /// pagination bound. The final character of the last segment's
    /// action-id field is bumped to the next alphabet character; at the
    /// top of the alphabet a minimum character is appended instead of
    /// wrapping, so the result is always a strict successor.
    pub fn get_next_postbox_id(&self, id: &str) -> Option<String> {
        let parsed = self.parse(id);
        let depths = parsed.postbox()?;
        let last = depths.last()?;

        let action = last.segment.action_id.to_string();
        let successor = successor_token(&action);

        let mut specs: Vec<SegmentSpec> = depths.iter().map(|d| (&d.segment).into()).collect();
        if let Some(spec) = specs.last_mut() {
            spec.action_id = successor;
        }
        let next = self.render_postbox_id(&specs);
        debug!(id, next, "computed pagination successor");
        Some(next)
    }
}

fn check_shape(
    entity_type: EntityType,
    requested: IdShape,
    requested_name: &str,
) -> IdentityResult<()> {
    let expected = entity_type.id_shape();
    if expected != requested {
        return Err(IdentityError::WrongShape {
            entity_type: entity_type.to_string(),
            expected: format!("{:?}", expected),
            requested: requested_name.to_string(),
        });
    }
    Ok(())
}

/// Smallest string strictly greater than `token` over the id alphabet.
fn successor_token(token: &str) -> String {
    let mut bytes = token.as_bytes().to_vec();
    match bytes.last().and_then(|b| ID_ALPHABET.iter().position(|a| a == b)) {
        Some(pos) if pos + 1 < ID_ALPHABET.len() => {
            *bytes.last_mut().unwrap() = ID_ALPHABET[pos + 1];
        }
        // Top of the alphabet (or a character outside it): appending
        // the minimum character is still a strict successor and cannot
        // collide with a real fixed-length sibling.
        _ => bytes.push(ID_ALPHABET[0]),
    }
    String::from_utf8(bytes).unwrap_or_else(|_| format!("{}0", token))
}

fn parse_uncached(id: &str) -> ParsedId {
    if id.is_empty() {
        return ParsedId::Unknown(String::new());
    }

    // Typed suffix: parent and link shapes.
    if let Some((left, suffix)) = id.rsplit_once(TYPE_SEP) {
        if let Ok(entity_type) = EntityType::from_code_hex(suffix) {
            match entity_type.id_shape() {
                IdShape::Link => {
                    if let Some((to_many, one)) = left.rsplit_once(LINK_SEP) {
                        if !to_many.is_empty() && !one.is_empty() {
                            return ParsedId::Link {
                                to_many: to_many.to_string(),
                                one: one.to_string(),
                                entity_type,
                            };
                        }
                    }
                    return ParsedId::Unknown(id.to_string());
                }
                IdShape::Parent => {
                    if left.is_empty() || left.contains(LINK_SEP) || left.contains(SEGMENT_SEP) {
                        return ParsedId::Unknown(id.to_string());
                    }
                    let bases: Vec<String> =
                        left.split(FIELD_SEP).map(str::to_string).collect();
                    if bases.iter().any(String::is_empty) {
                        return ParsedId::Unknown(id.to_string());
                    }
                    return ParsedId::Parent { bases, entity_type };
                }
                // A postbox/action type code after ':' is not a valid
                // id; fall through to the other shapes.
                IdShape::Postbox | IdShape::BareAction => {}
            }
        }
    }

    if let Some(depths) = parse_postbox(id) {
        return ParsedId::Postbox(depths);
    }

    if let Some(action) = ActionId::parse(id) {
        return ParsedId::Action(action);
    }

    ParsedId::Unknown(id.to_string())
}

fn parse_postbox(id: &str) -> Option<Vec<PostboxDepth>> {
    let mut depths: Vec<PostboxDepth> = Vec::new();
    let mut epoch: Option<BlockOrder> = None;
    let mut ancestors: HashSet<String> = HashSet::new();
    let mut prefix = String::new();

    for (depth, raw_segment) in id.split(SEGMENT_SEP).enumerate() {
        let fields: Vec<&str> = raw_segment.split(FIELD_SEP).collect();
        if fields.len() != 3 {
            return None;
        }

        // Forum (root) segments are written field-reversed.
        let (type_hex, packed, action_str) = if depth == 0 {
            (fields[2], fields[1], fields[0])
        } else {
            (fields[0], fields[1], fields[2])
        };

        let entity_type = EntityType::from_code_hex(type_hex).ok()?;
        if !entity_type.is_postbox() {
            return None;
        }
        if (depth == 0) != (entity_type == EntityType::Forum) {
            return None;
        }

        let parsed_order = BlockOrder::parse(packed, epoch.as_ref()).ok()?;
        let action_id = ActionId::parse(action_str)?;

        if depth > 0 {
            prefix.push(SEGMENT_SEP);
        }
        prefix.push_str(raw_segment);

        ancestors.insert(action_str.to_string());
        ancestors.insert(action_id.normalized());

        depths.push(PostboxDepth {
            id: prefix.clone(),
            segment: PostboxSegment {
                entity_type,
                block_order: parsed_order.order,
                packed_block_order: packed.to_string(),
                action_id,
            },
            ancestor_action_ids: ancestors.clone(),
        });

        if entity_type.is_epoch_provider() && epoch.is_none() {
            epoch = Some(parsed_order.order);
        }
    }

    if depths.is_empty() {
        None
    } else {
        Some(depths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdentityCodec {
        IdentityCodec::new()
    }

    fn order(timestamp: u64, block: u64, txn: u16) -> BlockOrder {
        BlockOrder::new(timestamp, 3, block, txn)
    }

    fn forum_id(c: &IdentityCodec) -> String {
        c.postbox_id(
            EntityType::Forum,
            None,
            "aaaaaaaaaaaaaaaa",
            &order(1_600_000_000, 100, 1),
        )
        .unwrap()
    }

    fn topic_id(c: &IdentityCodec, forum: &str, action: &str) -> String {
        c.postbox_id(EntityType::Topic, Some(forum), action, &order(1_600_000_100, 200, 2))
            .unwrap()
    }

    #[test]
    fn parent_id_round_trip() {
        let c = codec();
        let id = c
            .parent_id(EntityType::Profile, &["bbbbbbbbbbbbbbbb"])
            .unwrap();
        match &*c.parse(&id) {
            ParsedId::Parent { bases, entity_type } => {
                assert_eq!(bases, &["bbbbbbbbbbbbbbbb"]);
                assert_eq!(*entity_type, EntityType::Profile);
            }
            other => panic!("expected parent, got {:?}", other),
        }
        assert_eq!(c.get_type_from_id(&id), Some(EntityType::Profile));
        assert_eq!(c.get_parent_id_from_id(&id), None);
    }

    #[test]
    fn link_id_round_trip() {
        let c = codec();
        let forum = forum_id(&c);
        let id = c.link_id(EntityType::Count, &forum, "3").unwrap();
        match &*c.parse(&id) {
            ParsedId::Link {
                to_many,
                one,
                entity_type,
            } => {
                assert_eq!(to_many, &forum);
                assert_eq!(one, "3");
                assert_eq!(*entity_type, EntityType::Count);
            }
            other => panic!("expected link, got {:?}", other),
        }
        assert_eq!(c.get_parent_id_from_id(&id), Some(forum));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let c = codec();
        assert!(c.parent_id(EntityType::Count, &["x"]).is_err());
        assert!(c.link_id(EntityType::Profile, "a", "b").is_err());
        assert!(c
            .postbox_id(EntityType::Profile, None, "aaaaaaaaaaaaaaaa", &BlockOrder::zero())
            .is_err());
    }

    #[test]
    fn postbox_hierarchy_round_trip() {
        let c = codec();
        let forum = forum_id(&c);
        let topic = topic_id(&c, &forum, "cccccccccccccccc");
        let post = c
            .postbox_id(
                EntityType::Post,
                Some(&topic),
                "dddddddddddddddd",
                &order(1_600_000_200, 300, 3),
            )
            .unwrap();

        let parsed = c.parse(&post);
        let depths = parsed.postbox().expect("postbox");
        assert_eq!(depths.len(), 3);
        assert_eq!(depths[0].segment.entity_type, EntityType::Forum);
        assert_eq!(depths[1].segment.entity_type, EntityType::Topic);
        assert_eq!(depths[2].segment.entity_type, EntityType::Post);

        // Epoch compression round-trips to the absolute tuple.
        assert_eq!(depths[2].segment.block_order, order(1_600_000_200, 300, 3));
        // Post segment is epoch-compressed against the topic.
        assert_eq!(depths[2].segment.packed_block_order.len(), 20);
        // Topic segment stays canonical.
        assert_eq!(depths[1].segment.packed_block_order.len(), 32);

        assert_eq!(c.get_postbox_forum_id(&post), Some(forum.clone()));
        assert_eq!(c.get_postbox_topic_id(&post), Some(topic.clone()));
        assert_eq!(c.get_parent_id_from_id(&post), Some(topic));
        assert_eq!(c.postbox_depth(&post), Some(3));
        assert_eq!(c.get_type_from_id(&post), Some(EntityType::Post));
    }

    #[test]
    fn ancestor_containment() {
        let c = codec();
        let forum = forum_id(&c);
        let topic = topic_id(&c, &forum, "cccccccccccccccc");
        let post = c
            .postbox_id(
                EntityType::Post,
                Some(&topic),
                "dddddddddddddddd",
                &order(1_600_000_200, 300, 3),
            )
            .unwrap();

        assert!(c.has_ancestor_action_id(&post, "aaaaaaaaaaaaaaaa"));
        assert!(c.has_ancestor_action_id(&post, "cccccccccccccccc"));
        assert!(c.has_ancestor_action_id(&post, "dddddddddddddddd"));
        assert!(!c.has_ancestor_action_id(&post, "eeeeeeeeeeeeeeee"));
        assert!(!c.has_ancestor_action_id(&forum, "cccccccccccccccc"));
    }

    #[test]
    fn optimistic_ancestors_match_either_form() {
        let c = codec();
        let forum = forum_id(&c);
        let topic = topic_id(&c, &forum, "1700000000?cccccccccccccccc");
        assert!(c.has_ancestor_action_id(&topic, "1700000000?cccccccccccccccc"));
        assert!(c.has_ancestor_action_id(&topic, "cccccccccccccccc"));
    }

    #[test]
    fn normalization_is_idempotent_and_confirmation_invariant() {
        let c = codec();
        let forum = forum_id(&c);
        let pending_topic = topic_id(&c, &forum, "1700000000?cccccccccccccccc");
        let confirmed_topic = topic_id(&c, &forum, "cccccccccccccccc");

        let n1 = c.normalize_id(&pending_topic);
        let n2 = c.normalize_id(&confirmed_topic);
        assert_eq!(n1, n2);
        assert_eq!(c.normalize_id(&n1), n1);

        // Block-order fields are all zeroed.
        let parsed = c.parse(&n1);
        for depth in parsed.postbox().unwrap() {
            assert_eq!(depth.segment.block_order, BlockOrder::zero());
        }
    }

    #[test]
    fn normalization_recurses_into_link_components() {
        let c = codec();
        let forum = forum_id(&c);
        let pending_topic = topic_id(&c, &forum, "1700000000?cccccccccccccccc");
        let count = c.link_id(EntityType::Count, &pending_topic, "3").unwrap();

        let normalized = c.normalize_id(&count);
        let confirmed_topic = topic_id(&c, &forum, "cccccccccccccccc");
        let expected = c
            .link_id(EntityType::Count, &c.normalize_id(&confirmed_topic), "3")
            .unwrap();
        assert_eq!(normalized, expected);
    }

    #[test]
    fn opaque_strings_parse_to_unknown_and_normalize_unchanged() {
        let c = codec();
        for opaque in ["did:tribune:alice", "0xdeadbeef", "", "forum&garbage"] {
            assert!(matches!(&*c.parse(opaque), ParsedId::Unknown(_)));
            assert_eq!(c.normalize_id(opaque), opaque);
            assert_eq!(c.get_type_from_id(opaque), None);
        }
    }

    #[test]
    fn successor_increments_within_the_alphabet() {
        assert_eq!(successor_token("aaaa"), "aaab");
        // '9' steps to 'a', not to ASCII ':'
        assert_eq!(successor_token("aaa9"), "aaaa");
        // top of the alphabet appends instead of wrapping
        assert_eq!(successor_token("aaaz"), "aaaz0");
        assert!("aaaz0" > "aaaz");
    }

    #[test]
    fn next_postbox_id_is_a_strict_successor() {
        let c = codec();
        let forum = forum_id(&c);
        let topic = topic_id(&c, &forum, "cccccccccccccccc");

        let next = c.get_next_postbox_id(&topic).unwrap();
        assert!(next > topic);
        // Sibling created later still sorts after the original.
        assert!(c.get_next_postbox_id("not-an-id").is_none());
    }

    #[test]
    fn cache_hits_refresh_recency() {
        let c = IdentityCodec::with_capacity(2);
        c.parse("did:tribune:alice");
        c.parse("did:tribune:bob");
        c.parse("did:tribune:alice");
        // Fills the second slot by evicting bob, the least recently
        // used entry, not alice.
        c.parse("did:tribune:carol");

        c.parse("did:tribune:alice");
        let stats = c.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 3);

        c.parse("did:tribune:bob");
        assert_eq!(c.stats().misses, 4);
    }

    #[test]
    fn parse_is_memoized() {
        let c = codec();
        let forum = forum_id(&c);
        let first = c.parse(&forum);
        let second = c.parse(&forum);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = c.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
        assert!(stats.hit_rate() > 0.0);
    }
}
