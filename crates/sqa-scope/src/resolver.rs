//! Scope resolution
//!
//! Normalizes the caller's authorization payload into the set of account
//! codes the request is permitted to see. Fail closed: anything empty,
//! missing, or malformed resolves to the empty set, never to an error and
//! never to a default "allow all".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Authorization payload as callers send it: either a comma-separated
/// string or a sequence of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopePayload {
    /// `"0002990,0003001"`
    Joined(String),
    /// `["0002990", "0003001"]`
    Listed(Vec<String>),
}

/// Deduplicated set of authorized account codes.
///
/// Deterministic iteration order; blank codes cannot enter the set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    /// Empty scope (sees nothing)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from any iterator of codes, trimming and dropping blanks
    #[must_use]
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = codes
            .into_iter()
            .filter_map(|c| {
                let trimmed = c.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect();
        Self(set)
    }

    /// True when the caller is authorized for nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of codes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    /// Codes in deterministic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True when any of `candidates` is in the set.
    ///
    /// This is the row-membership rule for the dataset: a row belongs to the
    /// caller when its scope list and the caller's codes share any element.
    pub fn intersects<'a, I>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().any(|c| self.0.contains(c))
    }
}

/// Resolve the effective scope for a caller.
///
/// `identity` is the opaque caller identity (from the auth layer) and is
/// used for logging only; validating that the identity is actually entitled
/// to the requested codes belongs to the auth collaborator, not this core.
#[must_use]
pub fn resolve_scope(identity: &str, payload: Option<&ScopePayload>) -> ScopeSet {
    let scope = match payload {
        None => ScopeSet::empty(),
        Some(ScopePayload::Joined(joined)) => ScopeSet::from_codes(joined.split(',')),
        Some(ScopePayload::Listed(codes)) => ScopeSet::from_codes(codes),
    };

    if scope.is_empty() {
        // Caller-contract problem, not a data-quality problem: log loudly.
        tracing::warn!(identity, "no usable authorization codes in payload, access denied");
    } else {
        tracing::info!(identity, scope_count = scope.len(), "resolved scope");
    }

    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_payload_resolves_empty() {
        assert!(resolve_scope("user1", None).is_empty());
    }

    #[test]
    fn empty_string_resolves_empty() {
        let payload = ScopePayload::Joined(String::new());
        assert!(resolve_scope("user1", Some(&payload)).is_empty());
    }

    #[test]
    fn whitespace_only_resolves_empty() {
        let payload = ScopePayload::Joined("  , ,\t".to_string());
        assert!(resolve_scope("user1", Some(&payload)).is_empty());

        let payload = ScopePayload::Listed(vec!["  ".to_string(), String::new()]);
        assert!(resolve_scope("user1", Some(&payload)).is_empty());
    }

    #[test]
    fn joined_string_is_split_and_trimmed() {
        let payload = ScopePayload::Joined("A,B, C".to_string());
        let scope = resolve_scope("user1", Some(&payload));

        assert_eq!(scope.len(), 3);
        assert!(scope.contains("A"));
        assert!(scope.contains("B"));
        assert!(scope.contains("C"));
    }

    #[test]
    fn duplicates_collapse() {
        let payload = ScopePayload::Listed(vec!["A".into(), "A".into(), " A ".into()]);
        let scope = resolve_scope("user1", Some(&payload));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn payload_deserializes_both_shapes() {
        let joined: ScopePayload = serde_json::from_str("\"A,B\"").unwrap();
        assert_eq!(joined, ScopePayload::Joined("A,B".to_string()));

        let listed: ScopePayload = serde_json::from_str("[\"A\",\"B\"]").unwrap();
        assert_eq!(listed, ScopePayload::Listed(vec!["A".into(), "B".into()]));

        // Neither shape: rejected at the serde boundary, so the caller falls
        // back to None and the resolver fails closed.
        assert!(serde_json::from_str::<ScopePayload>("{\"codes\": 1}").is_err());
    }

    #[test]
    fn intersects_any_element_in_common() {
        let scope = ScopeSet::from_codes(["0002990"]);
        assert!(scope.intersects(["9999999", "0002990"]));
        assert!(!scope.intersects(["9999999"]));
        assert!(!scope.intersects(std::iter::empty::<&str>()));
    }
}
