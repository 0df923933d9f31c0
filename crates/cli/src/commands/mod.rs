//! Command implementations and the helpers they share.

pub mod analyze;
pub mod ask;
pub mod compare;
pub mod process;
pub mod status;
pub mod summarize;
pub mod workflow;

use formagent_agent::FormAgent;
use formagent_config::AppConfig;
use formagent_core::document::Document;
use formagent_core::error::Result;
use formagent_core::ledger::CallLedger;
use std::sync::Arc;
use tracing::warn;

/// Global flags that override the configuration.
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub deadline_secs: Option<u64>,
}

pub fn load_config(overrides: &Overrides) -> Result<AppConfig> {
    let mut config = AppConfig::load_with_overrides(
        overrides.provider.as_deref(),
        overrides.model.as_deref(),
    )?;
    if overrides.deadline_secs.is_some() {
        config.client.deadline_secs = overrides.deadline_secs;
    }
    Ok(config)
}

/// Build the agent. Ctrl-C cancels any model call in flight.
pub fn build_agent(overrides: &Overrides) -> Result<FormAgent> {
    let config = load_config(overrides)?;
    let agent = FormAgent::from_config(&config, Arc::new(CallLedger::new()))?;

    let token = agent.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling model calls");
            token.cancel();
        }
    });

    Ok(agent)
}

/// Process every file, reporting progress on stderr.
pub async fn process_all(agent: &FormAgent, files: &[String]) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        eprintln!("  Processing {file}...");
        documents.push(agent.process_form(file).await?);
    }
    Ok(documents)
}

pub fn print_usage(agent: &FormAgent) {
    let usage = agent.ledger().snapshot();
    println!();
    println!("Total LLM calls: {}", usage.calls);
    if usage.input_tokens + usage.output_tokens > 0 {
        println!(
            "Tokens:          {} in / {} out",
            usage.input_tokens, usage.output_tokens
        );
    }
}

pub fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}
