//! Routing
//!
//! The pipeline's only branch point. Pure and idempotent: the same intent
//! always routes the same way.

use crate::state::Intent;
use serde::{Deserialize, Serialize};

/// Branch chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteTarget {
    /// Ad-hoc tabular analysis
    Analytics,
    /// Document retrieval
    Retrieval,
    /// Decline: nothing recognized
    End,
}

/// Map an intent to its branch.
#[inline]
#[must_use]
pub fn route(intent: Intent) -> RouteTarget {
    match intent {
        Intent::Analytics => RouteTarget::Analytics,
        Intent::Eta | Intent::Status | Intent::Delay => RouteTarget::Retrieval,
        Intent::Unknown => RouteTarget::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_is_total_and_fixed() {
        assert_eq!(route(Intent::Analytics), RouteTarget::Analytics);
        assert_eq!(route(Intent::Eta), RouteTarget::Retrieval);
        assert_eq!(route(Intent::Status), RouteTarget::Retrieval);
        assert_eq!(route(Intent::Delay), RouteTarget::Retrieval);
        assert_eq!(route(Intent::Unknown), RouteTarget::End);
    }

    #[test]
    fn routing_is_idempotent() {
        assert_eq!(route(Intent::Eta), route(Intent::Eta));
    }
}
