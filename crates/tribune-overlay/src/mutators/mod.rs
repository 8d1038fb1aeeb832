//! Type-scoped mutators. Each one owns a predicate over
//! `{entity_type, crud}`, returns its own delta, and no-ops on every
//! shape it does not recognize. Nothing in here can fail.

pub mod admin;
pub mod counts;
pub mod interaction_vote;
pub mod pin;
pub mod postbox;
pub mod profile;
pub mod user;
pub mod vote;
pub mod wallet;
