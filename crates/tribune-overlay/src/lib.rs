//! Optimistic overlay engine.
//!
//! Takes one unconfirmed action plus the entities the client already
//! knows, and produces the delta the UI should show while the chain
//! catches up: synthesized placeholder entities, partial field edits,
//! and redirects to already-confirmed entities. Outputs from separate
//! actions combine with an associative merge, so batches can be folded
//! in any grouping.

pub mod engine;
pub mod mutators;
pub mod output;

pub use engine::{mutate_pending_from_action, MutatorCtx};
pub use output::{EditEntry, OverlayOutput, COUNTER_FIELDS};
