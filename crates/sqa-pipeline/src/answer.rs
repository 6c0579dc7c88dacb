//! Answer synthesis
//!
//! Converges both branches: whatever of retrieved documents and analytics
//! output is populated becomes a context block, and the chat collaborator
//! turns it into prose grounded only in that block. The caller always gets
//! some `answer_text`, whatever failed before or during this stage.

use crate::state::RequestState;
use sqa_core::{ChatCompletion, ChatMessage, PipelineConfig};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// Fixed reply when neither branch produced anything
pub const NO_RESULTS_ANSWER: &str =
    "I couldn't find any information matching your request within your authorized scope.";

/// Fixed reply when the chat collaborator fails at this stage
pub const SYNTHESIS_FALLBACK_ANSWER: &str =
    "I found relevant information but encountered an error generating the summary. \
     Please try again.";

const SYSTEM_PROMPT: &str = "You are a helpful shipment Q&A assistant. \
    Use the provided context (analytics and/or documents) to answer the user's question. \
    If providing analytics, summarize the key figures. \
    If the answer is not in the context, say you don't know. \
    Be concise and professional.";

/// Merges branch results and asks the chat collaborator for the final prose
pub struct AnswerSynthesizer {
    chat: Arc<dyn ChatCompletion>,
    timeout: Duration,
    temperature: f32,
    document_cap: usize,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over the injected chat collaborator
    #[must_use]
    pub fn new(chat: Arc<dyn ChatCompletion>, config: &PipelineConfig) -> Self {
        Self {
            chat,
            timeout: config.backend_timeout(),
            temperature: config.answer_temperature,
            document_cap: config.top_k,
        }
    }

    /// Produce `answer_text` for the request.
    ///
    /// A state that already carries an answer (decline, empty-view early
    /// answer) passes through untouched.
    pub async fn synthesize(&self, mut state: RequestState) -> RequestState {
        if state.answer_text.is_some() {
            return state;
        }

        let context = build_context(&state, self.document_cap);
        if context.is_empty() {
            state.answer_text = Some(NO_RESULTS_ANSWER.to_string());
            return state;
        }

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Context:\n{context}\n\nQuestion: {}\n\nAnswer:",
                state.question_raw
            )),
        ];

        match tokio::time::timeout(self.timeout, self.chat.complete(&messages, self.temperature))
            .await
        {
            Ok(Ok(reply)) => {
                tracing::info!(chars = reply.content.len(), "synthesized answer");
                state.answer_text = Some(reply.content);
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "answer synthesis failed");
                state.push_error(format!("answer synthesis failed: {e}"));
                state.answer_text = Some(SYNTHESIS_FALLBACK_ANSWER.to_string());
            }
            Err(_) => {
                tracing::error!("answer synthesis timed out");
                state.push_error(format!(
                    "answer synthesis timed out after {}s",
                    self.timeout.as_secs()
                ));
                state.answer_text = Some(SYNTHESIS_FALLBACK_ANSWER.to_string());
            }
        }

        state
    }
}

impl std::fmt::Debug for AnswerSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerSynthesizer")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Render the grounding context. Empty string means nothing to ground on.
fn build_context(state: &RequestState, document_cap: usize) -> String {
    let mut context = String::new();

    if let Some(analytics) = &state.analytics {
        let _ = writeln!(context, "--- Analytics ---");
        let _ = writeln!(context, "Matching rows: {}", analytics.row_count);
        if !analytics.facets.is_empty() {
            let facets = analytics
                .facets
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(context, "Status facets: {facets}");
        }
        if let Some(rendered) = &analytics.rendered {
            let _ = writeln!(context, "Result: {rendered}");
        }
    }

    for (i, doc) in state.documents.iter().take(document_cap).enumerate() {
        let _ = writeln!(context, "\n--- Document {} ---", i + 1);
        let _ = writeln!(context, "Content: {}", doc.content);
        if let Some(container) = &doc.container_number {
            let _ = writeln!(context, "Container: {container}");
        }
    }

    context
}
