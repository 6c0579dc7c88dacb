//! End-to-end pipeline scenarios: routing, scope denial, branch failures,
//! and the guarantee that every run ends with an answer.

use pretty_assertions::assert_eq;
use sqa_core::PipelineConfig;
use sqa_pipeline::{
    Intent, Orchestrator, Request, DECLINE_ANSWER, NO_RESULTS_ANSWER, SYNTHESIS_FALLBACK_ANSWER,
};
use sqa_scope::ScopePayload;
use sqa_test_utils::{
    fixture_dataset_bytes, fixture_documents, MemoryObjectStore, ScriptedChat, ScriptedSandbox,
    StaticSearch,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    store: Arc<MemoryObjectStore>,
    search: Arc<StaticSearch>,
    chat: Arc<ScriptedChat>,
    orchestrator: Orchestrator,
    _cache_dir: TempDir,
}

fn harness(chat: ScriptedChat, sandbox: ScriptedSandbox) -> Harness {
    let cache_dir = TempDir::new().unwrap();
    let config = PipelineConfig::new()
        .with_cache_dir(cache_dir.path())
        .with_backend_timeout_secs(5);

    let store = Arc::new(MemoryObjectStore::new());
    store.put(&config.blob_container, &config.blob_name, fixture_dataset_bytes());
    let search = Arc::new(StaticSearch::new(fixture_documents()));
    let chat = Arc::new(chat);

    let orchestrator = Orchestrator::new(
        config,
        search.clone(),
        chat.clone(),
        store.clone(),
        Arc::new(sandbox),
    );

    Harness {
        store,
        search,
        chat,
        orchestrator,
        _cache_dir: cache_dir,
    }
}

fn scoped(question: &str, conversation: &str, codes: &str) -> Request {
    Request::new(question, conversation, "user1")
        .with_scope_payload(ScopePayload::Joined(codes.to_string()))
}

#[tokio::test]
async fn eta_question_routes_to_retrieval() {
    let chat = ScriptedChat::new().with_reply("Container ABCD1234567 arrived on 2026-08-01.");
    let h = harness(chat, ScriptedSandbox::returning(serde_json::json!(null)));

    let state = h
        .orchestrator
        .run(scoped("What is the ETA for container ABCD1234567?", "c1", "TEST"))
        .await;

    assert_eq!(
        state.question_normalized.as_deref(),
        Some("what is the eta for container abcd1234567?")
    );
    assert_eq!(state.entities.containers, vec!["ABCD1234567"]);
    assert_eq!(state.intent, Some(Intent::Eta));

    let plan = state.retrieval_plan.as_ref().unwrap();
    assert_eq!(plan.query_text, "ABCD1234567");

    // The filter travelled with the query and carries the caller's scope.
    let query = h.search.last_query().unwrap();
    assert!(query.filter.contains("TEST"));

    assert!(!state.documents.is_empty());
    assert_eq!(
        state.answer_text.as_deref(),
        Some("Container ABCD1234567 arrived on 2026-08-01.")
    );
    assert!(state.errors().is_empty());
}

#[tokio::test]
async fn chart_question_routes_to_analytics() {
    let chat = ScriptedChat::new()
        .with_reply("```python\nresult = len(df)\n```")
        .with_reply("You have 1 shipment, currently delivered.");
    let sandbox = ScriptedSandbox::returning(serde_json::json!(1));
    let h = harness(chat, sandbox);

    let state = h
        .orchestrator
        .run(scoped("Show me a chart of delays", "c2", "0002990"))
        .await;

    assert_eq!(state.intent, Some(Intent::Analytics));
    assert!(state.satisfied);

    let analytics = state.analytics.as_ref().unwrap();
    assert_eq!(analytics.row_count, 1, "only the caller's row is visible");
    assert_eq!(analytics.rendered.as_deref(), Some("1"));

    assert_eq!(
        state.answer_text.as_deref(),
        Some("You have 1 shipment, currently delivered.")
    );
    assert_eq!(h.store.download_count(), 1);
}

#[tokio::test]
async fn empty_scope_analytics_declines_without_a_fetch() {
    let h = harness(
        ScriptedChat::new(),
        ScriptedSandbox::returning(serde_json::json!(0)),
    );

    let state = h
        .orchestrator
        .run(Request::new("Show me a chart of delays", "c3", "user1"))
        .await;

    assert!(state
        .errors()
        .iter()
        .any(|e| e.contains("no authorized account codes")));
    assert_eq!(state.answer_text.as_deref(), Some(NO_RESULTS_ANSWER));
    assert_eq!(h.store.download_count(), 0, "scope denial must precede any fetch");
    assert_eq!(h.chat.request_count(), 0, "no generation on a denied request");
}

#[tokio::test]
async fn empty_scope_retrieval_returns_no_documents() {
    let h = harness(
        ScriptedChat::new(),
        ScriptedSandbox::returning(serde_json::json!(0)),
    );

    let state = h
        .orchestrator
        .run(Request::new("What is the ETA for container ABCD1234567?", "c4", "user1"))
        .await;

    let query = h.search.last_query().unwrap();
    assert_eq!(query.filter, "false");
    assert!(state.documents.is_empty());
    assert_eq!(state.answer_text.as_deref(), Some(NO_RESULTS_ANSWER));
}

#[tokio::test]
async fn unroutable_question_is_declined() {
    let h = harness(
        ScriptedChat::new(),
        ScriptedSandbox::returning(serde_json::json!(0)),
    );

    let state = h
        .orchestrator
        .run(scoped("tell me a story", "c5", "TEST"))
        .await;

    assert_eq!(state.intent, Some(Intent::Unknown));
    assert_eq!(state.answer_text.as_deref(), Some(DECLINE_ANSWER));
    assert!(h.search.last_query().is_none(), "decline path must not search");
}

#[tokio::test]
async fn sandbox_failure_still_produces_an_answer() {
    let chat = ScriptedChat::new().with_reply("```python\nboom()\n```");
    let sandbox = ScriptedSandbox::raising("name 'boom' is not defined");
    let h = harness(chat, sandbox);

    let state = h
        .orchestrator
        .run(scoped("analytics on my shipments", "c6", "0002990"))
        .await;

    assert!(!state.satisfied);
    assert!(state.errors().iter().any(|e| e.contains("analysis failed")));
    assert!(state.answer_text.is_some(), "pipeline must not crash on sandbox errors");
}

#[tokio::test]
async fn fetch_failure_is_recorded_not_thrown() {
    let h = harness(
        ScriptedChat::new(),
        ScriptedSandbox::returning(serde_json::json!(0)),
    );
    h.store.fail_with("blob credentials missing");

    let state = h
        .orchestrator
        .run(scoped("analytics please", "c7", "0002990"))
        .await;

    assert!(state.errors().iter().any(|e| e.contains("data load failed")));
    assert!(state.answer_text.is_some());
}

#[tokio::test]
async fn synthesis_failure_falls_back_to_an_apology() {
    // One reply for nothing: the chat script is empty, so the synthesis
    // call fails while documents were retrieved fine.
    let h = harness(
        ScriptedChat::failing(),
        ScriptedSandbox::returning(serde_json::json!(0)),
    );

    let state = h
        .orchestrator
        .run(scoped("where is container ABCD1234567?", "c8", "TEST"))
        .await;

    assert!(!state.documents.is_empty());
    assert_eq!(state.answer_text.as_deref(), Some(SYNTHESIS_FALLBACK_ANSWER));
    assert!(state
        .errors()
        .iter()
        .any(|e| e.contains("answer synthesis failed")));
}

#[tokio::test]
async fn second_analytics_run_reuses_the_snapshot() {
    let chat = ScriptedChat::new()
        .with_reply("```python\nresult = 1\n```")
        .with_reply("first answer")
        .with_reply("```python\nresult = 1\n```")
        .with_reply("second answer");
    let h = harness(chat, ScriptedSandbox::returning(serde_json::json!(1)));

    let first = h
        .orchestrator
        .run(scoped("analytics run one", "c9", "0002990"))
        .await;
    let second = h
        .orchestrator
        .run(scoped("analytics run two", "c10", "0002990"))
        .await;

    assert!(first.satisfied && second.satisfied);
    assert_eq!(h.store.download_count(), 1, "same-day runs share one snapshot");
}

#[tokio::test]
async fn finished_runs_leave_no_checkpoint() {
    let chat = ScriptedChat::new().with_reply("done");
    let h = harness(chat, ScriptedSandbox::returning(serde_json::json!(0)));

    h.orchestrator
        .run(scoped("where is container ABCD1234567?", "c11", "TEST"))
        .await;

    assert!(!h.orchestrator.has_checkpoint("c11"));
    assert!(h.orchestrator.resume("c11").await.is_none());
}

#[tokio::test]
async fn concurrent_conversations_do_not_interfere() {
    let chat = ScriptedChat::new()
        .with_reply("answer a")
        .with_reply("answer b");
    let h = harness(chat, ScriptedSandbox::returning(serde_json::json!(0)));
    let orchestrator = Arc::new(h.orchestrator);

    let a = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .run(scoped("where is container ABCD1234567?", "conv-a", "TEST"))
                .await
        })
    };
    let b = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .run(scoped("where is container WXYZ7654321?", "conv-b", "TEST"))
                .await
        })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert_eq!(a.conversation_id, "conv-a");
    assert_eq!(b.conversation_id, "conv-b");
    assert!(a.answer_text.is_some() && b.answer_text.is_some());
}
