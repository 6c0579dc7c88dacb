//! Request orchestration for shipment Q&A
//!
//! The deterministic pipeline a question passes through:
//! normalize → extract → classify → route, then either the retrieval
//! branch (plan → search) or the analytics branch (filtered load →
//! sandboxed execution), converging on answer synthesis.
//!
//! Authorization holds at every stage: the scope set is resolved once
//! before the pipeline runs, the retrieval branch carries it as a compiled
//! server-side filter, and the analytics branch refuses to touch storage
//! without it.

pub mod answer;
pub mod orchestrator;
pub mod stages;
pub mod state;

pub use answer::{AnswerSynthesizer, NO_RESULTS_ANSWER, SYNTHESIS_FALLBACK_ANSWER};
pub use orchestrator::{Orchestrator, DECLINE_ANSWER};
pub use stages::RouteTarget;
pub use state::{
    AnalyticsSummary, ExtractedEntities, Intent, Request, RequestState, RetrievalPlan, Stage,
};
