//! Provider trait: the abstraction over chat-completion backends.
//!
//! A Provider sends one request to one model and returns the assistant turn.
//! Model fallback is layered on top of this trait, not inside it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// A single chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model identifier (e.g., "gemma2-9b-it")
    pub model: String,

    /// The conversation turns, system prompt first
    pub messages: Vec<Message>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may request. Empty means no function calling.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.3
}

/// A tool definition sent to the LLM so it knows what it can call.
///
/// Serializes to `{name, description, parameters}`, the shape expected inside
/// the `function` member of a function-calling tool entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,

    pub description: String,

    /// JSON Schema: `{type: "object", properties, required}`
    pub parameters: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The assistant turn, possibly carrying tool-invocation requests
    pub message: Message,

    pub usage: Option<Usage>,

    /// Which model actually responded
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Implementations must report "no choices" as `ProviderError::EmptyResponse`
/// so the fallback chain can treat it like a capacity failure.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "groq").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
