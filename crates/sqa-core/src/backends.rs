//! External collaborator contracts
//!
//! The core consumes four services through these traits and never through
//! concrete clients:
//! - `SearchBackend`: the document search index
//! - `ChatCompletion`: the language-model chat service
//! - `ObjectStore`: the blob store holding the master dataset
//! - `CodeSandbox`: the isolated evaluator for generated analytics code
//!
//! Implementations are injected at orchestrator construction, so every test
//! run builds its own collaborators instead of sharing process-wide
//! singletons.

use crate::types::{ChatMessage, ChatReply, Document, SearchQuery};
use async_trait::async_trait;

/// Failure of an external collaborator call
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Service unreachable or returned a transport-level failure
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its bounded timeout
    #[error("backend call timed out after {0}s")]
    Timeout(u64),

    /// Service answered with something the contract does not allow
    #[error("backend protocol violation: {0}")]
    Protocol(String),
}

/// Document search index.
///
/// The backend must honor `query.filter` server-side as an AND-combined
/// predicate restricting results to the caller's authorized scope.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a search and return documents ordered by relevance
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Document>, BackendError>;
}

/// Stateless, single-turn chat completion service
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Complete a conversation and return the model's reply
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<ChatReply, BackendError>;
}

/// Blob object store holding the master dataset
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download a blob in full. Missing blob or credentials fail the call.
    async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>, BackendError>;
}

/// Isolated evaluator for model-generated code.
///
/// The evaluation context on the other side of this contract exposes only
/// the provided `bindings` and a minimal safe function set: no imports, no
/// filesystem, no network. The returned value is whatever the code assigned
/// to the designated output binding; anything the code raised comes back as
/// an `Err`.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    /// Evaluate `code` with `bindings` in scope and return the output binding
    async fn run(
        &self,
        code: &str,
        bindings: serde_json::Value,
    ) -> Result<serde_json::Value, BackendError>;
}
