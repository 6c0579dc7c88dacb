//! Ad-hoc analytics execution
//!
//! Turns an open-ended analytic question into a value: describe the
//! filtered view to the chat collaborator, extract the generated code, run
//! it in the sandbox with nothing but the view bound, and read back the
//! designated `result` binding.
//!
//! The isolation boundary is the point of this module: the generation step
//! sees a schema description and a tiny literal sample, and the execution
//! step sees exactly one binding. Neither side is handed the authorization
//! codes, the cache directory, or any ambient capability.

use crate::error::ExecutorError;
use crate::schema::{self, COLUMN_SYNONYMS, SCHEMA_REGISTRY};
use crate::table::DataTable;
use once_cell::sync::Lazy;
use regex::Regex;
use sqa_core::{ChatCompletion, ChatMessage, CodeSandbox, PipelineConfig};
use std::sync::Arc;
use std::time::Duration;

/// Name of the binding the generated code must assign its answer to
pub const OUTPUT_BINDING: &str = "result";

/// Name under which the filtered view is bound in the sandbox
pub const VIEW_BINDING: &str = "df";

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:python)?\s*(.*?)```").expect("fence pattern compiles"));

/// Outcome of one sandboxed analysis
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The code ran and assigned the output binding
    Success {
        /// Value of the output binding
        result: serde_json::Value,
    },
    /// The code raised inside the sandbox
    Failed {
        /// Sandbox error message
        error: String,
    },
}

impl ExecutionOutcome {
    /// True for [`ExecutionOutcome::Success`]
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }
}

/// Generates and safely executes analysis code against a filtered view
pub struct AnalyticsExecutor {
    chat: Arc<dyn ChatCompletion>,
    sandbox: Arc<dyn CodeSandbox>,
    timeout: Duration,
    temperature: f32,
}

impl AnalyticsExecutor {
    /// Create an executor over injected collaborators
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatCompletion>,
        sandbox: Arc<dyn CodeSandbox>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            chat,
            sandbox,
            timeout: config.backend_timeout(),
            temperature: config.codegen_temperature,
        }
    }

    /// Answer `question` against `view`.
    ///
    /// Returns `Err` when code generation itself fails (chat failure,
    /// timeout, empty code); sandbox-side failures come back as
    /// `Ok(ExecutionOutcome::Failed)` so the caller can record them without
    /// treating them as infrastructure problems.
    pub async fn run(
        &self,
        question: &str,
        view: &DataTable,
    ) -> Result<ExecutionOutcome, ExecutorError> {
        let messages = [
            ChatMessage::system(describe_view(view)),
            ChatMessage::user(format!("Question: {question}")),
        ];

        let reply = match tokio::time::timeout(
            self.timeout,
            self.chat.complete(&messages, self.temperature),
        )
        .await
        {
            Err(_) => return Err(ExecutorError::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) => return Err(ExecutorError::Generation(e.to_string())),
            Ok(Ok(reply)) => reply,
        };

        let code = extract_code(&reply.content);
        if code.is_empty() {
            return Err(ExecutorError::EmptyCode);
        }

        tracing::debug!(code_len = code.len(), "executing generated analysis code");
        let bindings = serde_json::json!({ VIEW_BINDING: view.to_records() });

        match tokio::time::timeout(self.timeout, self.sandbox.run(&code, bindings)).await {
            Err(_) => Err(ExecutorError::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "sandbox execution failed");
                Ok(ExecutionOutcome::Failed {
                    error: e.to_string(),
                })
            }
            Ok(Ok(result)) => Ok(ExecutionOutcome::Success { result }),
        }
    }
}

impl std::fmt::Debug for AnalyticsExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsExecutor")
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Build the system prompt describing the filtered view.
///
/// Only model-visible columns are described; the scoping column and other
/// internal fields never appear.
fn describe_view(view: &DataTable) -> String {
    let mut columns = String::new();
    for name in view.columns() {
        if schema::is_internal(name) {
            continue;
        }
        match SCHEMA_REGISTRY.get(name.as_str()) {
            Some(meta) => {
                columns.push_str(&format!("- {name}: {}\n", meta.description));
            }
            None => columns.push_str(&format!("- {name}\n")),
        }
    }

    let synonyms = COLUMN_SYNONYMS
        .iter()
        .map(|(word, column)| format!("{word} -> {column}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a data analyst. A tabular dataset of shipment records is \
         bound as `{VIEW_BINDING}` (a list of records).\n\
         \n\
         ## Dataset\n\
         Rows: {rows}, Columns: {cols}\n\
         Columns:\n{columns}\n\
         Sample:\n{sample}\n\
         Synonyms: {synonyms}\n\
         \n\
         ## Instructions\n\
         1. Write code that answers the user's question using `{VIEW_BINDING}` only.\n\
         2. Assign the final answer to the variable `{OUTPUT_BINDING}`.\n\
         3. Do not import anything, read files, or access the network.\n\
         4. Return ONLY the code inside a ```python``` block.",
        rows = view.row_count(),
        cols = view.column_count(),
        sample = view.head_markdown(3),
    )
}

/// Extract runnable code from a model reply.
///
/// Takes the first fenced block. A reply without a fence is treated as code
/// verbatim; the fallback is logged so operators can see how often it
/// engages.
fn extract_code(content: &str) -> String {
    if let Some(captures) = CODE_FENCE.captures(content) {
        return captures
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
    }
    let fallback = content.trim();
    if !fallback.is_empty() {
        tracing::warn!("model reply had no code fence, executing reply verbatim");
    }
    fallback.to_string()
}
