//! Reasoning-service providers for FormAgent.
//!
//! All providers implement the `formagent_core::Provider` trait.
//! [`build_provider`] selects one from configuration, and [`ModelClient`]
//! wraps it with timeouts, retries and call accounting.

pub mod anthropic;
pub mod client;
pub mod openai_compat;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use client::{ClientConfig, ModelClient};
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_provider;
