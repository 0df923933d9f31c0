//! Shared test helpers for agent tests.

use crate::orchestrator::FormAgent;
use formagent_core::document::Document;
use formagent_core::error::ProviderError;
use formagent_core::ledger::CallLedger;
use formagent_core::loader::LoadedSource;
use formagent_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use formagent_core::result::{ExtractionResult, TypeDetection};
use formagent_providers::{ClientConfig, ModelClient};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock provider that replies with a sequence of scripted texts.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
        }
    }

    /// A provider whose only reply is `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            replies: Mutex::new(vec![Err(error)]),
            prompts: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// User-turn text of every request received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let replies = self.replies.lock().unwrap();

        if *count >= replies.len() {
            panic!(
                "ScriptedProvider: no more replies (call #{}, have {})",
                *count,
                replies.len()
            );
        }

        let reply = replies[*count].clone();
        *count += 1;
        self.prompts.lock().unwrap().push(request.prompt);

        reply.map(|content| ProviderResponse {
            content,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }
}

/// Client settings with no retries and short delays.
pub fn fast_client_config() -> ClientConfig {
    ClientConfig {
        model: "mock-model".into(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(10),
        max_tokens: 1024,
        temperature: 0.0,
        deadline: None,
    }
}

pub fn agent_with(provider: Arc<ScriptedProvider>) -> FormAgent {
    let client = ModelClient::new(provider, fast_client_config(), Arc::new(CallLedger::new()));
    FormAgent::new(client)
}

/// A processed document with the given text and fields.
pub fn document(text: &str, fields: &[(&str, &str)]) -> Document {
    Document::assemble(
        LoadedSource::inline("test.txt", text),
        ExtractionResult {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            field_confidences: BTreeMap::new(),
            confidence: 0.9,
            reasoning: "test".into(),
            form_type_hint: None,
        },
        TypeDetection {
            form_type: None,
            confidence: 0.5,
            reasoning: String::new(),
        },
    )
    .unwrap()
}
