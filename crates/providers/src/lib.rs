//! Model provider implementations for Codeforge.
//!
//! The router only sees the `Provider` trait from core; this crate supplies
//! the OpenAI-compatible HTTP implementation, which covers OpenAI,
//! OpenRouter, Ollama, vLLM, and any other endpoint speaking the
//! `/v1/chat/completions` dialect.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use codeforge_config::AppConfig;
use codeforge_core::Provider;
use std::sync::Arc;

/// Build the configured provider.
pub fn from_config(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(
        "openai-compat",
        &config.provider.api_url,
        config.provider.api_key.clone().unwrap_or_default(),
    ))
}
