//! Row-level authorization for the shipment Q&A pipeline
//!
//! Two small, heavily tested pieces that every data-touching branch depends
//! on:
//! - `resolver`: turns the caller-provided authorization payload into a
//!   deduplicated [`ScopeSet`], failing closed on anything malformed
//! - `filter`: compiles a scope set into the backend-native predicate the
//!   search collaborator applies server-side
//!
//! The invariant enforced here: an empty scope set can never widen into
//! "see everything". It compiles to a predicate that matches nothing, and
//! the analytics path returns empty views without touching storage.

mod filter;
mod resolver;

pub use filter::build_search_filter;
pub use resolver::{resolve_scope, ScopePayload, ScopeSet};
