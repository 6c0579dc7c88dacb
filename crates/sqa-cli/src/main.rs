//! Run one question through the shipment Q&A pipeline against simulated
//! collaborators.

mod simulator;

use clap::Parser;
use simulator::{SimChat, SimSandbox, SimSearch, SimStore};
use sqa_core::PipelineConfig;
use sqa_pipeline::{Orchestrator, Request};
use sqa_scope::ScopePayload;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqa", about = "Shipment Q&A pipeline driver")]
struct Cli {
    /// The question to ask
    question: String,

    /// Conversation id (durability partition key)
    #[arg(long, default_value = "local")]
    conversation: String,

    /// Comma-separated authorization codes; omit to see the fail-closed path
    #[arg(long)]
    codes: Option<String>,

    /// Snapshot cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let cache_dir = cli
        .cache_dir
        .unwrap_or_else(|| std::env::temp_dir().join("sqa-demo-cache"));
    let config = PipelineConfig::new().with_cache_dir(cache_dir);

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(SimSearch),
        Arc::new(SimChat),
        Arc::new(SimStore),
        Arc::new(SimSandbox),
    );

    let mut request = Request::new(cli.question, cli.conversation, "cli-user");
    if let Some(codes) = cli.codes {
        request = request.with_scope_payload(ScopePayload::Joined(codes));
    }

    let state = orchestrator.run(request).await;

    println!(
        "answer: {}",
        state.answer_text.as_deref().unwrap_or("(none)")
    );
    if let Some(intent) = state.intent {
        println!("intent: {}", intent.as_str());
    }
    for notice in state.notices() {
        println!("notice: {notice}");
    }
    for error in state.errors() {
        eprintln!("error: {error}");
    }

    Ok(())
}
