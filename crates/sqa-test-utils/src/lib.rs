//! Testing utilities for the shipment Q&A workspace
//!
//! In-memory collaborator doubles and dataset fixtures shared across crate
//! tests. Every double records enough of what it saw for tests to assert
//! on call counts and payloads.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sqa_core::{
    BackendError, ChatCompletion, ChatMessage, ChatReply, CodeSandbox, Document, ObjectStore,
    SearchBackend, SearchQuery,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory object store. Counts downloads so cache-reuse tests can assert
/// that the second load of a day does not refetch.
#[derive(Default)]
pub struct MemoryObjectStore {
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
    downloads: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob under `container`/`name`
    pub fn put(&self, container: &str, name: &str, bytes: Vec<u8>) {
        self.blobs
            .lock()
            .insert((container.to_string(), name.to_string()), bytes);
    }

    /// Make every subsequent download fail with `message`
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    /// Clear a previously configured failure
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn download(&self, container: &str, blob: &str) -> Result<Vec<u8>, BackendError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().clone() {
            return Err(BackendError::Unavailable(message));
        }
        self.blobs
            .lock()
            .get(&(container.to_string(), blob.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::Unavailable(format!("blob not found: {container}/{blob}")))
    }
}

/// Chat double that replays scripted replies in order and records every
/// request. An exhausted script fails the call, which doubles as the
/// "chat collaborator down" fixture.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: &str) -> Self {
        self.replies.lock().push_back(reply.to_string());
        self
    }

    /// A chat double whose every call fails
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Messages of the `n`th recorded request
    pub fn request(&self, n: usize) -> Option<Vec<ChatMessage>> {
        self.requests.lock().get(n).cloned()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<ChatReply, BackendError> {
        self.requests.lock().push(messages.to_vec());
        match self.replies.lock().pop_front() {
            Some(content) => Ok(ChatReply { content }),
            None => Err(BackendError::Unavailable("chat script exhausted".to_string())),
        }
    }
}

/// Search double serving a fixed document list. Honors the one filter
/// property the core depends on: the literal `"false"` predicate matches
/// nothing. Records the last query for plan assertions.
#[derive(Default)]
pub struct StaticSearch {
    docs: Vec<Document>,
    last_query: Mutex<Option<SearchQuery>>,
}

impl StaticSearch {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs,
            last_query: Mutex::new(None),
        }
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.last_query.lock().clone()
    }
}

#[async_trait]
impl SearchBackend for StaticSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Document>, BackendError> {
        *self.last_query.lock() = Some(query.clone());
        if query.filter == "false" {
            return Ok(Vec::new());
        }
        Ok(self.docs.iter().take(query.top_k).cloned().collect())
    }
}

/// Sandbox double: returns a canned output binding value, or fails every
/// run. Records the last code it was asked to execute.
pub struct ScriptedSandbox {
    outcome: Result<Value, String>,
    last_code: Mutex<Option<String>>,
    last_bindings: Mutex<Option<Value>>,
}

impl ScriptedSandbox {
    pub fn returning(value: Value) -> Self {
        Self {
            outcome: Ok(value),
            last_code: Mutex::new(None),
            last_bindings: Mutex::new(None),
        }
    }

    pub fn raising(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            last_code: Mutex::new(None),
            last_bindings: Mutex::new(None),
        }
    }

    pub fn last_code(&self) -> Option<String> {
        self.last_code.lock().clone()
    }

    pub fn last_bindings(&self) -> Option<Value> {
        self.last_bindings.lock().clone()
    }
}

#[async_trait]
impl CodeSandbox for ScriptedSandbox {
    async fn run(&self, code: &str, bindings: Value) -> Result<Value, BackendError> {
        *self.last_code.lock() = Some(code.to_string());
        *self.last_bindings.lock() = Some(bindings);
        self.outcome
            .clone()
            .map_err(BackendError::Protocol)
    }
}

/// Master dataset fixture: two rows scoped to different accounts, the
/// smallest shape that can leak across scopes.
pub fn fixture_records() -> Vec<Value> {
    vec![
        json!({
            "container_number": "ABCD1234567",
            "shipment_status": "DELIVERED",
            "cargo_weight_kg": "1200.5",
            "eta_dp_date": "2026-08-01",
            "discharge_port": "ROTTERDAM",
            "consignee_codes": ["0002990"],
        }),
        json!({
            "container_number": "WXYZ7654321",
            "shipment_status": "IN_OCEAN",
            "cargo_weight_kg": "800",
            "eta_dp_date": "2026-08-15",
            "discharge_port": "HAMBURG",
            "consignee_codes": ["9999999"],
        }),
    ]
}

/// The fixture dataset serialized the way the blob store serves it
pub fn fixture_dataset_bytes() -> Vec<u8> {
    serde_json::to_vec(&fixture_records()).expect("fixture serializes")
}

/// Retrieval fixture documents
pub fn fixture_documents() -> Vec<Document> {
    vec![
        Document::new("doc-1", "Container ABCD1234567 arrived at Rotterdam on 2026-08-01.")
            .with_container("ABCD1234567")
            .with_field("shipment_status", "DELIVERED"),
        Document::new("doc-2", "Container WXYZ7654321 is in ocean transit to Hamburg.")
            .with_container("WXYZ7654321")
            .with_field("shipment_status", "IN_OCEAN"),
    ]
}
