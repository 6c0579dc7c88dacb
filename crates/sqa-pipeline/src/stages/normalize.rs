//! Question normalization

use crate::state::RequestState;

/// Lower-case and trim the raw question. Runs first; the normalized text is
/// immutable for the rest of the pipeline.
#[must_use]
pub fn normalize(mut state: RequestState) -> RequestState {
    let normalized = state.question_raw.trim().to_lowercase();
    tracing::debug!(normalized = %normalized, "normalized question");
    state.question_normalized = Some(normalized);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Request;
    use sqa_scope::ScopeSet;

    #[test]
    fn lowercases_and_trims() {
        let request = Request::new("  What is the ETA?  ", "c1", "user");
        let state = normalize(RequestState::new(&request, ScopeSet::empty()));
        assert_eq!(state.question_normalized.as_deref(), Some("what is the eta?"));
        assert_eq!(state.question_raw, "  What is the ETA?  ");
    }
}
