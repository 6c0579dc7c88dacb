//! Search filter compilation
//!
//! Translates a resolved scope set into the predicate string the search
//! backend applies server-side. This is the single enforcement point for
//! the retrieval branch: the planner attaches the expression to every query
//! and never filters client-side.

use crate::resolver::ScopeSet;

/// Compile `scope` into a predicate over the collection field `field`.
///
/// Empty scope compiles to the literal `"false"`, a predicate that matches
/// nothing. Non-empty scopes use the index's set-membership operator rather
/// than a disjunction of equality terms, which degrades badly on large code
/// sets. Single quotes in codes are doubled so a code can never terminate
/// the string literal early.
#[must_use]
pub fn build_search_filter(scope: &ScopeSet, field: &str) -> String {
    if scope.is_empty() {
        return "false".to_string();
    }

    let joined = scope
        .iter()
        .map(|code| code.replace('\'', "''"))
        .collect::<Vec<_>>()
        .join(",");

    format!("{field}/any(t: search.in(t, '{joined}', ','))")
}
