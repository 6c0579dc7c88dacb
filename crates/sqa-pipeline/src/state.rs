//! Request state threaded through the pipeline
//!
//! One strongly typed record per request. Stages own specific fields and
//! never touch the rest; `errors` and `notices` are append-only across the
//! whole run, enforced by keeping the vectors private.

use serde::{Deserialize, Serialize};
use sqa_core::Document;
use sqa_scope::{ScopePayload, ScopeSet};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Classified purpose of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Open-ended tabular analysis
    Analytics,
    /// Arrival estimate lookup
    Eta,
    /// Current location / phase lookup
    Status,
    /// Delay lookup
    Delay,
    /// Nothing recognized
    Unknown,
}

impl Intent {
    /// Stable lowercase name, used in log lines and plan rationales
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Analytics => "analytics",
            Intent::Eta => "eta",
            Intent::Status => "status",
            Intent::Delay => "delay",
            Intent::Unknown => "unknown",
        }
    }
}

/// Structured identifiers pulled from the question. All three kinds are
/// always present; empty means nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    /// Container codes (4 letters + 7 digits)
    pub containers: Vec<String>,
    /// Purchase-order codes
    pub purchase_orders: Vec<String>,
    /// Bill-of-lading codes
    pub bills_of_lading: Vec<String>,
}

impl ExtractedEntities {
    /// True when no identifier of any kind matched
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
            && self.purchase_orders.is_empty()
            && self.bills_of_lading.is_empty()
    }

    /// All identifiers in retrieval priority order: containers, then bills
    /// of lading, then purchase orders.
    #[must_use]
    pub fn id_tokens(&self) -> Vec<&str> {
        self.containers
            .iter()
            .chain(self.bills_of_lading.iter())
            .chain(self.purchase_orders.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Structured description of one document-search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalPlan {
    /// Query text (identifiers beat free text)
    pub query_text: String,
    /// Final result count
    pub top_k: usize,
    /// Vector candidate pool size
    pub vector_k: usize,
    /// Authorization predicate for the backend to apply server-side
    pub filter: String,
    /// Why the plan looks the way it does
    pub rationale: String,
}

/// Summary of one analytics execution, feeding answer synthesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Rows in the filtered view
    pub row_count: usize,
    /// Status facet counts over the view
    pub facets: BTreeMap<String, u64>,
    /// Rendered result of the executed analysis
    pub rendered: Option<String>,
}

/// Pipeline stages, in execution order. `Route` is the only branch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Normalize the question text
    Normalize,
    /// Extract structured identifiers
    Extract,
    /// Classify intent
    Classify,
    /// Pick the branch
    Route,
    /// Build the retrieval plan
    Plan,
    /// Execute the search
    Retrieve,
    /// Run scoped analytics
    Analyze,
    /// Synthesize the final answer
    Answer,
    /// Terminal
    End,
}

/// A caller-submitted request, before scope resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// The natural-language question
    pub question: String,
    /// Opaque correlation key; also the durability partition key
    pub conversation_id: String,
    /// Opaque caller identity, for logging
    pub identity: String,
    /// Raw authorization payload as the caller sent it
    pub scope_payload: Option<ScopePayload>,
}

impl Request {
    /// Create a request
    #[inline]
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        conversation_id: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            conversation_id: conversation_id.into(),
            identity: identity.into(),
            scope_payload: None,
        }
    }

    /// With an authorization payload
    #[inline]
    #[must_use]
    pub fn with_scope_payload(mut self, payload: ScopePayload) -> Self {
        self.scope_payload = Some(payload);
        self
    }
}

/// The mutable record threaded through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestState {
    /// Question exactly as submitted
    pub question_raw: String,
    /// Lower-cased, trimmed question; set once by the normalize stage
    pub question_normalized: Option<String>,
    /// Correlation / durability key
    pub conversation_id: String,
    /// Per-request trace id
    pub trace_id: Uuid,
    /// Authorized account codes, resolved once before any data stage
    pub scope: ScopeSet,
    /// Extracted identifiers
    pub entities: ExtractedEntities,
    /// Classified intent
    pub intent: Option<Intent>,
    /// Plan for the retrieval branch
    pub retrieval_plan: Option<RetrievalPlan>,
    /// Retrieved documents
    pub documents: Vec<Document>,
    /// Analytics branch output
    pub analytics: Option<AnalyticsSummary>,
    /// Final answer; always populated by the time the pipeline ends
    pub answer_text: Option<String>,
    /// Whether the branch that ran considers the question answered
    pub satisfied: bool,
    errors: Vec<String>,
    notices: Vec<String>,
}

impl RequestState {
    /// Build the initial state for a request with its resolved scope
    #[must_use]
    pub fn new(request: &Request, scope: ScopeSet) -> Self {
        Self {
            question_raw: request.question.clone(),
            question_normalized: None,
            conversation_id: request.conversation_id.clone(),
            trace_id: Uuid::new_v4(),
            scope,
            entities: ExtractedEntities::default(),
            intent: None,
            retrieval_plan: None,
            documents: Vec::new(),
            analytics: None,
            answer_text: None,
            satisfied: false,
            errors: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// The question the data stages should work from
    #[inline]
    #[must_use]
    pub fn effective_question(&self) -> &str {
        self.question_normalized
            .as_deref()
            .unwrap_or(&self.question_raw)
    }

    /// Record a stage-local failure
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Record a non-fatal observation
    pub fn push_notice(&mut self, notice: impl Into<String>) {
        self.notices.push(notice.into());
    }

    /// Recorded failures, in order
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Recorded notices, in order
    #[inline]
    #[must_use]
    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_tokens_priority_order() {
        let entities = ExtractedEntities {
            containers: vec!["ABCD1234567".into()],
            purchase_orders: vec!["PO12345".into()],
            bills_of_lading: vec!["OBLXY123Z".into()],
        };
        assert_eq!(
            entities.id_tokens(),
            vec!["ABCD1234567", "OBLXY123Z", "PO12345"]
        );
    }

    #[test]
    fn errors_are_append_only() {
        let request = Request::new("q", "c1", "user");
        let mut state = RequestState::new(&request, ScopeSet::empty());
        state.push_error("first");
        state.push_error("second");
        assert_eq!(state.errors(), ["first", "second"]);
    }

    #[test]
    fn effective_question_falls_back_to_raw() {
        let request = Request::new("RAW", "c1", "user");
        let mut state = RequestState::new(&request, ScopeSet::empty());
        assert_eq!(state.effective_question(), "RAW");
        state.question_normalized = Some("raw".into());
        assert_eq!(state.effective_question(), "raw");
    }
}
