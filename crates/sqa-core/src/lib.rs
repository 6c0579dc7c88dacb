//! Shared foundation for the shipment Q&A workspace
//!
//! Defines the pieces every other crate agrees on:
//! - Document and chat-message types exchanged with collaborators
//! - The four external collaborator contracts (search, chat, object store,
//!   code sandbox)
//! - Pipeline configuration

pub mod backends;
pub mod config;
pub mod types;

pub use backends::{BackendError, ChatCompletion, CodeSandbox, ObjectStore, SearchBackend};
pub use config::PipelineConfig;
pub use types::{ChatMessage, ChatReply, ChatRole, Document, SearchQuery};
