//! LLM provider implementations for Leadbot.
//!
//! [`OpenAiCompatProvider`] talks to any `/chat/completions` endpoint.
//! [`FallbackChain`] layers the ordered model list on top of one provider.

pub mod fallback;
pub mod openai_compat;

pub use fallback::{Completion, FallbackChain, ModelDescriptor, NO_CHOICES_NOTICE, UNAVAILABLE_NOTICE};
pub use openai_compat::OpenAiCompatProvider;

use leadbot_config::ProviderConfig;
use leadbot_core::error::ProviderError;
use std::sync::Arc;
use std::time::Duration;

/// Build the fallback chain described by the `[provider]` config section.
pub fn build_from_config(config: &ProviderConfig) -> Result<FallbackChain, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "No API key for provider '{}'. Set LEADBOT_API_KEY or run `leadbot onboard`.",
                config.name
            ))
        })?;

    let provider = OpenAiCompatProvider::with_timeout(
        &config.name,
        &config.base_url,
        api_key,
        Duration::from_secs(config.timeout_secs),
    );

    tracing::debug!(
        provider = %config.name,
        models = ?config.models,
        "Building fallback chain"
    );

    Ok(FallbackChain::new(Arc::new(provider), config.models.iter().cloned())
        .with_temperature(config.temperature)
        .with_max_tokens(Some(config.max_tokens)))
}
