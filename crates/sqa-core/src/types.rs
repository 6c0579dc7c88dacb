//! Wire types exchanged with the external collaborators

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A shipment document returned by the search backend.
///
/// `fields` carries whatever additional index attributes the backend
/// returned; the core only relies on `id`, `content`, and
/// `container_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Index document id
    pub id: String,
    /// Retrieved text content
    pub content: String,
    /// Container the document refers to, when known
    pub container_number: Option<String>,
    /// Remaining retrieved fields, name -> value
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with just id and content
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            container_number: None,
            fields: BTreeMap::new(),
        }
    }

    /// With container number
    #[inline]
    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container_number = Some(container.into());
        self
    }

    /// With an extra retrieved field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction
    System,
    /// End-user turn
    User,
    /// Model turn
    Assistant,
}

/// Single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: ChatRole,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// System message
    #[inline]
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// User message
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Single-turn chat completion result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Generated text
    pub content: String,
}

/// A planned search request.
///
/// `filter` is a backend-native predicate the search collaborator must apply
/// server-side, AND-combined with the query. It is the row-level
/// authorization boundary for the retrieval branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text
    pub text: String,
    /// Authorization predicate, applied server-side
    pub filter: String,
    /// Final result count
    pub top_k: usize,
    /// Vector candidate pool size
    pub vector_k: usize,
}
