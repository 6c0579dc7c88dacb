//! Intent classification
//!
//! Deterministic keyword lookup in fixed priority order. Intentionally
//! simple; downstream treats [`Intent`] as opaque, so a model-based
//! classifier can replace this without touching the router.

use crate::state::{Intent, RequestState};

const ANALYTICS_KEYWORDS: &[&str] = &["chart", "analytics"];
const ETA_KEYWORDS: &[&str] = &["eta", "arrive"];
const STATUS_KEYWORDS: &[&str] = &["status", "where"];
const DELAY_KEYWORDS: &[&str] = &["delay"];

fn any_keyword(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Classify the normalized question into exactly one intent.
#[must_use]
pub fn classify(mut state: RequestState) -> RequestState {
    let text = state.effective_question();

    let intent = if any_keyword(text, ANALYTICS_KEYWORDS) {
        Intent::Analytics
    } else if any_keyword(text, ETA_KEYWORDS) {
        Intent::Eta
    } else if any_keyword(text, STATUS_KEYWORDS) {
        Intent::Status
    } else if any_keyword(text, DELAY_KEYWORDS) {
        Intent::Delay
    } else {
        Intent::Unknown
    };

    tracing::debug!(intent = intent.as_str(), "classified intent");
    state.intent = Some(intent);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::normalize;
    use crate::state::Request;
    use sqa_scope::ScopeSet;

    fn intent_of(question: &str) -> Intent {
        let request = Request::new(question, "c1", "user");
        let state = classify(normalize(RequestState::new(&request, ScopeSet::empty())));
        state.intent.unwrap()
    }

    #[test]
    fn chart_means_analytics() {
        assert_eq!(intent_of("Show me a chart of delays"), Intent::Analytics);
    }

    #[test]
    fn analytics_beats_every_other_keyword() {
        assert_eq!(
            intent_of("analytics on delayed arrivals and status"),
            Intent::Analytics
        );
    }

    #[test]
    fn eta_beats_status_and_delay() {
        assert_eq!(intent_of("eta for the delayed one, where is it"), Intent::Eta);
    }

    #[test]
    fn plain_lookups() {
        assert_eq!(intent_of("what is the ETA for ABCD1234567?"), Intent::Eta);
        assert_eq!(intent_of("where is my container"), Intent::Status);
        assert_eq!(intent_of("is it delayed"), Intent::Delay);
    }

    #[test]
    fn nothing_matched_is_unknown() {
        assert_eq!(intent_of("tell me a story"), Intent::Unknown);
    }
}
