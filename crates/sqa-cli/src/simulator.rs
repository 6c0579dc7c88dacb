//! Simulated collaborators for local runs
//!
//! Deterministic in-process stand-ins for the four external services, good
//! enough to watch a question travel the whole pipeline without any
//! network credentials. Not used by tests (those live in sqa-test-utils);
//! this module exists so the binary runs out of the box.

use async_trait::async_trait;
use serde_json::{json, Value};
use sqa_core::{
    BackendError, ChatCompletion, ChatMessage, ChatReply, CodeSandbox, Document, ObjectStore,
    SearchBackend, SearchQuery,
};

/// Demo dataset served by [`SimStore`]
fn demo_records() -> Value {
    json!([
        {
            "container_number": "ABCD1234567",
            "shipment_status": "DELIVERED",
            "cargo_weight_kg": "1200.5",
            "eta_dp_date": "2026-08-01",
            "discharge_port": "ROTTERDAM",
            "dp_delayed_dur": "0",
            "consignee_codes": ["0002990"]
        },
        {
            "container_number": "WXYZ7654321",
            "shipment_status": "IN_OCEAN",
            "cargo_weight_kg": "800",
            "eta_dp_date": "2026-08-15",
            "discharge_port": "HAMBURG",
            "dp_delayed_dur": "3",
            "consignee_codes": ["0002990", "0003001"]
        },
        {
            "container_number": "QRST1112223",
            "shipment_status": "READY_FOR_PICKUP",
            "cargo_weight_kg": "450",
            "eta_dp_date": "2026-07-28",
            "discharge_port": "ANTWERP",
            "dp_delayed_dur": "1",
            "consignee_codes": ["9999999"]
        }
    ])
}

/// Object store serving the embedded demo dataset
pub(crate) struct SimStore;

#[async_trait]
impl ObjectStore for SimStore {
    async fn download(&self, _container: &str, _blob: &str) -> Result<Vec<u8>, BackendError> {
        serde_json::to_vec(&demo_records())
            .map_err(|e| BackendError::Protocol(e.to_string()))
    }
}

/// Search backend over a handful of canned documents
pub(crate) struct SimSearch;

#[async_trait]
impl SearchBackend for SimSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Document>, BackendError> {
        if query.filter == "false" {
            return Ok(Vec::new());
        }
        let docs = vec![
            Document::new("doc-1", "Container ABCD1234567 was delivered at Rotterdam on 2026-08-01.")
                .with_container("ABCD1234567"),
            Document::new("doc-2", "Container WXYZ7654321 is in ocean transit, ETA Hamburg 2026-08-15.")
                .with_container("WXYZ7654321"),
        ];
        let needle = query.text.to_lowercase();
        let matching: Vec<Document> = docs
            .iter()
            .filter(|d| d.content.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        let hits = if matching.is_empty() { docs } else { matching };
        Ok(hits.into_iter().take(query.top_k).collect())
    }
}

/// Chat stand-in.
///
/// Distinguishes the two call sites by their system prompt: code-generation
/// requests get a fixed row-count program, synthesis requests get a short
/// recap of the context block.
pub(crate) struct SimChat;

#[async_trait]
impl ChatCompletion for SimChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<ChatReply, BackendError> {
        let system = messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if system.contains("data analyst") {
            return Ok(ChatReply {
                content: "```python\nresult = len(df)\n```".to_string(),
            });
        }

        let context = messages
            .get(1)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let summary: String = context.lines().take(6).collect::<Vec<_>>().join(" | ");
        Ok(ChatReply {
            content: format!("[simulated answer] {summary}"),
        })
    }
}

/// Sandbox stand-in understanding exactly the program [`SimChat`] emits
pub(crate) struct SimSandbox;

#[async_trait]
impl CodeSandbox for SimSandbox {
    async fn run(&self, code: &str, bindings: Value) -> Result<Value, BackendError> {
        let rows = bindings
            .get("df")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        if code.contains("len(df)") {
            return Ok(json!(rows));
        }
        Err(BackendError::Protocol(format!(
            "simulated sandbox cannot evaluate: {code}"
        )))
    }
}
