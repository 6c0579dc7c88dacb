//! Analytics executor protocol tests: prompt contract, fence handling, and
//! the failure envelope around sandbox execution.

use serde_json::json;
use sqa_analytics::{AnalyticsExecutor, DataTable, ExecutionOutcome, ExecutorError};
use sqa_core::{ChatRole, PipelineConfig};
use sqa_test_utils::{fixture_records, ScriptedChat, ScriptedSandbox};
use std::sync::Arc;

fn fixture_view() -> DataTable {
    DataTable::from_records(&fixture_records())
}

#[tokio::test]
async fn successful_run_returns_the_output_binding() {
    let chat = Arc::new(
        ScriptedChat::new().with_reply("```python\nresult = len(df)\n```"),
    );
    let sandbox = Arc::new(ScriptedSandbox::returning(json!(2)));
    let executor = AnalyticsExecutor::new(chat.clone(), sandbox.clone(), &PipelineConfig::new());

    let outcome = executor
        .run("how many shipments do I have?", &fixture_view())
        .await
        .unwrap();

    assert_eq!(outcome, ExecutionOutcome::Success { result: json!(2) });
    assert_eq!(sandbox.last_code().as_deref(), Some("result = len(df)"));

    // Only the filtered view crosses the isolation boundary.
    let bindings = sandbox.last_bindings().unwrap();
    let keys: Vec<&String> = bindings.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["df"]);
    assert_eq!(bindings["df"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn prompt_carries_schema_and_sample() {
    let chat = Arc::new(ScriptedChat::new().with_reply("```python\nresult = 0\n```"));
    let sandbox = Arc::new(ScriptedSandbox::returning(json!(0)));
    let executor = AnalyticsExecutor::new(chat.clone(), sandbox, &PipelineConfig::new());

    executor.run("count rows", &fixture_view()).await.unwrap();

    let request = chat.request(0).unwrap();
    assert_eq!(request[0].role, ChatRole::System);
    let system = &request[0].content;
    assert!(system.contains("Rows: 2"));
    assert!(system.contains("shipment_status"));
    assert!(!system.contains("consignee_codes"));
    assert!(request[1].content.contains("count rows"));
}

#[tokio::test]
async fn unfenced_reply_is_executed_verbatim() {
    let chat = Arc::new(ScriptedChat::new().with_reply("result = 'ok'"));
    let sandbox = Arc::new(ScriptedSandbox::returning(json!("ok")));
    let executor = AnalyticsExecutor::new(chat, sandbox.clone(), &PipelineConfig::new());

    let outcome = executor.run("anything", &fixture_view()).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(sandbox.last_code().as_deref(), Some("result = 'ok'"));
}

#[tokio::test]
async fn sandbox_raise_becomes_a_failed_outcome() {
    let chat = Arc::new(ScriptedChat::new().with_reply("```python\nboom\n```"));
    let sandbox = Arc::new(ScriptedSandbox::raising("name 'boom' is not defined"));
    let executor = AnalyticsExecutor::new(chat, sandbox, &PipelineConfig::new());

    let outcome = executor.run("explode", &fixture_view()).await.unwrap();

    match outcome {
        ExecutionOutcome::Failed { error } => assert!(error.contains("not defined")),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_failure_is_a_generation_error() {
    let chat = Arc::new(ScriptedChat::failing());
    let sandbox = Arc::new(ScriptedSandbox::returning(json!(0)));
    let executor = AnalyticsExecutor::new(chat, sandbox, &PipelineConfig::new());

    let err = executor.run("q", &fixture_view()).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Generation(_)));
}

#[tokio::test]
async fn empty_reply_is_empty_code() {
    let chat = Arc::new(ScriptedChat::new().with_reply("   "));
    let sandbox = Arc::new(ScriptedSandbox::returning(json!(0)));
    let executor = AnalyticsExecutor::new(chat, sandbox, &PipelineConfig::new());

    let err = executor.run("q", &fixture_view()).await.unwrap_err();
    assert!(matches!(err, ExecutorError::EmptyCode));
}
