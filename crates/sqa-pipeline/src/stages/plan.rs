//! Retrieval planning
//!
//! Builds the structured search request for the retrieval branch. Exact-ID
//! lookups beat free-text relevance, so extracted identifiers take priority
//! over the question text. The plan carries the authorization filter for
//! the backend to apply server-side; the planner never filters locally.

use crate::state::{Intent, RequestState, RetrievalPlan};
use sqa_core::PipelineConfig;
use sqa_scope::build_search_filter;

/// Produce the retrieval plan for the current request.
#[must_use]
pub fn plan(mut state: RequestState, config: &PipelineConfig) -> RequestState {
    let id_tokens = state.entities.id_tokens();
    let has_ids = !id_tokens.is_empty();
    let query_text = if has_ids {
        id_tokens.join(" ")
    } else {
        state.effective_question().to_string()
    };

    let intent = state.intent.unwrap_or(Intent::Unknown);
    let plan = RetrievalPlan {
        query_text,
        top_k: config.top_k,
        vector_k: config.vector_k,
        filter: build_search_filter(&state.scope, &config.scope_field),
        rationale: format!("intent={}; ids={has_ids}", intent.as_str()),
    };

    tracing::info!(
        query = %plan.query_text,
        top_k = plan.top_k,
        vector_k = plan.vector_k,
        rationale = %plan.rationale,
        "planned retrieval"
    );

    state.retrieval_plan = Some(plan);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{classify, extract, normalize};
    use crate::state::Request;
    use sqa_scope::ScopeSet;

    fn planned(question: &str, scope: ScopeSet) -> RetrievalPlan {
        let request = Request::new(question, "c1", "user");
        let state = RequestState::new(&request, scope);
        let state = plan(
            classify(extract(normalize(state))),
            &PipelineConfig::new(),
        );
        state.retrieval_plan.unwrap()
    }

    #[test]
    fn identifiers_take_priority_over_free_text() {
        let plan = planned(
            "what is the eta for container abcd1234567?",
            ScopeSet::from_codes(["A"]),
        );
        assert_eq!(plan.query_text, "ABCD1234567");
        assert!(plan.rationale.contains("ids=true"));
    }

    #[test]
    fn free_text_fallback_uses_the_whole_question() {
        let plan = planned("where are my delayed shipments", ScopeSet::from_codes(["A"]));
        assert_eq!(plan.query_text, "where are my delayed shipments");
        assert!(plan.rationale.contains("ids=false"));
    }

    #[test]
    fn limits_come_from_configuration() {
        let plan = planned("eta?", ScopeSet::from_codes(["A"]));
        assert_eq!(plan.top_k, 5);
        assert_eq!(plan.vector_k, 30);
    }

    #[test]
    fn empty_scope_plans_a_match_nothing_filter() {
        let plan = planned("eta for abcd1234567", ScopeSet::empty());
        assert_eq!(plan.filter, "false");
    }

    #[test]
    fn filter_embeds_the_scope() {
        let plan = planned("eta for abcd1234567", ScopeSet::from_codes(["0002990"]));
        assert!(plan.filter.contains("0002990"));
        assert!(plan.filter.contains("consignee_code_ids"));
    }
}
