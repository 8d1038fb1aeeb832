//! # Tribune Identity
//!
//! Deterministic, self-describing identifier codec for the Tribune
//! client. Identifiers embed entity type, ancestry, and causal ordering
//! directly in the string, in one of four shapes:
//!
//! - parent ids (`bases:typeHex`) for root entities,
//! - link ids (`toMany+one:typeHex`) for many-relationships,
//! - postbox ids (`&`-joined segments) for the threaded hierarchy,
//! - bare action ids in confirmed, optimistic, or local-counter form.
//!
//! Parsing is memoized per [`IdentityCodec`] instance and never fails:
//! strings that are not entity ids come back as [`ParsedId::Unknown`],
//! because DIDs and wallet addresses share the identifier space.

pub mod block_order;
pub mod codec;
pub mod error;
pub mod parsed;

pub use block_order::{BlockOrder, ParsedBlockOrder};
pub use codec::{CacheStats, IdParts, IdentityCodec, SegmentSpec};
pub use error::{BlockOrderError, IdentityError, IdentityResult};
pub use parsed::{ActionId, ParsedId, PostboxDepth, PostboxSegment, ACTION_HASH_LEN, ID_ALPHABET};
