//! Provider selection: builds the configured provider.
//!
//! Credentials are read once here; a missing key fails before any request
//! is attempted.

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use formagent_config::AppConfig;
use formagent_core::error::{Error, Result};
use formagent_core::provider::Provider;
use std::sync::Arc;
use tracing::debug;

/// Build the provider named by `config.provider`.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn Provider>> {
    let name = config.provider.as_str();

    if requires_api_key(name) && !config.has_api_key() {
        return Err(Error::Authentication(format!(
            "no API key configured for provider '{name}' \
             (set FORMAGENT_API_KEY or api_key in {})",
            AppConfig::config_dir().join("config.toml").display()
        )));
    }

    let api_key = config.api_key.clone().unwrap_or_default();
    let base_url = config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(name));

    debug!(provider = name, base_url = %base_url, "Building provider");

    let provider: Arc<dyn Provider> = match name {
        "anthropic" => {
            let mut p = AnthropicProvider::new(api_key);
            if config.api_url.is_some() {
                p = p.with_base_url(&base_url);
            }
            Arc::new(p)
        }
        "ollama" => Arc::new(OpenAiCompatProvider::ollama(Some(&base_url))),
        _ => Arc::new(OpenAiCompatProvider::new(name, &base_url, api_key)),
    };

    Ok(provider)
}

/// Local runtimes accept any key.
fn requires_api_key(provider_name: &str) -> bool {
    !matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "anthropic" => "https://api.anthropic.com".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

/// Seconds to wait from a `retry-after` header, defaulting to 5.
pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(5)
}
