//! Pipeline orchestration
//!
//! Threads a [`RequestState`] through the stage machine, checkpoints after
//! every completed stage keyed by conversation id, and converts stage-local
//! failures into recorded errors so the run always reaches `End` with some
//! answer.
//!
//! The orchestrator owns its collaborators: search, chat, object store, and
//! sandbox are injected at construction, so tests build an isolated
//! instance instead of reaching for process-wide singletons.

use crate::answer::AnswerSynthesizer;
use crate::stages::{self, RouteTarget};
use crate::state::{AnalyticsSummary, Intent, Request, RequestState, Stage};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqa_analytics::{AnalyticsExecutor, DatasetCache, ExecutionOutcome};
use sqa_core::{ChatCompletion, CodeSandbox, ObjectStore, PipelineConfig, SearchBackend, SearchQuery};
use sqa_scope::resolve_scope;
use std::sync::Arc;
use tracing::Instrument;

/// Fixed reply for questions the router cannot place
pub const DECLINE_ANSWER: &str =
    "I'm not sure how to help with that. Try asking about a shipment's status, arrival, \
     or delays, or ask for an analysis of your shipments.";

/// Durable record of a run in progress: the next stage to execute and the
/// state as of the last completed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Checkpoint {
    stage: Stage,
    state: RequestState,
}

/// Runs requests through the pipeline
pub struct Orchestrator {
    config: PipelineConfig,
    search: Arc<dyn SearchBackend>,
    cache: DatasetCache,
    executor: AnalyticsExecutor,
    answerer: AnswerSynthesizer,
    checkpoints: DashMap<String, Checkpoint>,
}

impl Orchestrator {
    /// Create an orchestrator over the four injected collaborators
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        search: Arc<dyn SearchBackend>,
        chat: Arc<dyn ChatCompletion>,
        store: Arc<dyn ObjectStore>,
        sandbox: Arc<dyn CodeSandbox>,
    ) -> Self {
        let cache = DatasetCache::new(store, &config);
        let executor = AnalyticsExecutor::new(chat.clone(), sandbox, &config);
        let answerer = AnswerSynthesizer::new(chat, &config);
        Self {
            config,
            search,
            cache,
            executor,
            answerer,
            checkpoints: DashMap::new(),
        }
    }

    /// Run one request to completion. Always returns a state with
    /// `answer_text` populated.
    pub async fn run(&self, request: Request) -> RequestState {
        let scope = resolve_scope(&request.identity, request.scope_payload.as_ref());
        let state = RequestState::new(&request, scope);

        let span = tracing::info_span!(
            "pipeline",
            conversation_id = %state.conversation_id,
            trace_id = %state.trace_id,
            scope_count = state.scope.len(),
        );
        self.advance(Stage::Normalize, state).instrument(span).await
    }

    /// Resume a conversation from its last completed stage, if a checkpoint
    /// exists for it in this process.
    pub async fn resume(&self, conversation_id: &str) -> Option<RequestState> {
        // Clone out of the map so no shard guard is held across awaits.
        let checkpoint = self
            .checkpoints
            .get(conversation_id)
            .map(|entry| entry.value().clone())?;

        let span = tracing::info_span!(
            "pipeline_resume",
            conversation_id,
            stage = ?checkpoint.stage,
        );
        Some(
            self.advance(checkpoint.stage, checkpoint.state)
                .instrument(span)
                .await,
        )
    }

    /// True while a conversation has an unfinished run
    #[must_use]
    pub fn has_checkpoint(&self, conversation_id: &str) -> bool {
        self.checkpoints.contains_key(conversation_id)
    }

    async fn advance(&self, mut stage: Stage, mut state: RequestState) -> RequestState {
        self.checkpoint(stage, &state);

        loop {
            stage = match stage {
                Stage::Normalize => {
                    state = stages::normalize(state);
                    Stage::Extract
                }
                Stage::Extract => {
                    state = stages::extract(state);
                    Stage::Classify
                }
                Stage::Classify => {
                    state = stages::classify(state);
                    Stage::Route
                }
                Stage::Route => match stages::route(state.intent.unwrap_or(Intent::Unknown)) {
                    RouteTarget::Retrieval => Stage::Plan,
                    RouteTarget::Analytics => Stage::Analyze,
                    RouteTarget::End => {
                        tracing::info!("no routable intent, declining");
                        state.push_notice("question did not match a supported intent".to_string());
                        state.answer_text = Some(DECLINE_ANSWER.to_string());
                        Stage::End
                    }
                },
                Stage::Plan => {
                    state = stages::plan(state, &self.config);
                    Stage::Retrieve
                }
                Stage::Retrieve => {
                    self.retrieve(&mut state).await;
                    Stage::Answer
                }
                Stage::Analyze => {
                    self.analyze(&mut state).await;
                    Stage::Answer
                }
                Stage::Answer => {
                    state = self.answerer.synthesize(state).await;
                    Stage::End
                }
                Stage::End => {
                    self.checkpoints.remove(&state.conversation_id);
                    return state;
                }
            };
            self.checkpoint(stage, &state);
        }
    }

    fn checkpoint(&self, stage: Stage, state: &RequestState) {
        self.checkpoints.insert(
            state.conversation_id.clone(),
            Checkpoint {
                stage,
                state: state.clone(),
            },
        );
    }

    /// Retrieval branch: execute the plan through the search collaborator.
    /// The authorization filter travels inside the plan; an empty scope has
    /// already compiled to a match-nothing predicate, so no special casing
    /// happens here.
    async fn retrieve(&self, state: &mut RequestState) {
        let Some(plan) = state.retrieval_plan.clone() else {
            state.push_error("retrieval reached without a plan".to_string());
            return;
        };

        let query = SearchQuery {
            text: plan.query_text,
            filter: plan.filter,
            top_k: plan.top_k,
            vector_k: plan.vector_k,
        };

        match tokio::time::timeout(self.config.backend_timeout(), self.search.search(&query)).await
        {
            Ok(Ok(documents)) => {
                tracing::info!(hits = documents.len(), "retrieval complete");
                state.documents = documents;
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "search backend failed");
                state.push_error(format!("search failed: {e}"));
            }
            Err(_) => {
                tracing::error!("search backend timed out");
                state.push_error(format!(
                    "search timed out after {}s",
                    self.config.backend_timeout_secs
                ));
            }
        }
    }

    /// Analytics branch: scope check, filtered load, sandboxed execution.
    async fn analyze(&self, state: &mut RequestState) {
        if state.scope.is_empty() {
            tracing::warn!("analytics requested with an empty scope, denying");
            state.push_error("no authorized account codes for analytics".to_string());
            return;
        }

        let view = match self.cache.load_filtered(&state.scope).await {
            Ok(view) => view,
            Err(e) => {
                tracing::error!(error = %e, "analytics data load failed");
                state.push_error(format!("data load failed: {e}"));
                return;
            }
        };

        if view.is_empty() {
            state.answer_text =
                Some("I found no shipment data available for your account.".to_string());
            state.satisfied = true;
            return;
        }

        let question = state.effective_question().to_string();
        match self.executor.run(&question, &view).await {
            Ok(ExecutionOutcome::Success { result }) => {
                state.analytics = Some(AnalyticsSummary {
                    row_count: view.row_count(),
                    facets: view.facets("shipment_status"),
                    rendered: Some(render_result(&result)),
                });
                state.satisfied = true;
            }
            Ok(ExecutionOutcome::Failed { error }) => {
                state.push_error(format!("analysis failed: {error}"));
                state.satisfied = false;
            }
            Err(e) => {
                state.push_error(e.to_string());
                state.satisfied = false;
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("checkpoints", &self.checkpoints.len())
            .finish_non_exhaustive()
    }
}

fn render_result(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
