//! OpenAI-compatible provider implementation.
//!
//! Works with Groq, OpenAI, OpenRouter, Together, vLLM and any endpoint that
//! exposes `/chat/completions` with function calling.

use async_trait::async_trait;
use leadbot_core::error::ProviderError;
use leadbot_core::message::{Message, MessageToolCall, Role};
use leadbot_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible chat-completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider with a 120s request timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_timeout(name, base_url, api_key, Duration::from_secs(120))
    }

    /// Create a provider with a custom request timeout.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create a Groq provider (convenience constructor).
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new("groq", "https://api.groq.com/openai/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Convert our turns to OpenAI API messages.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::ToolResult => "tool".into(),
                },
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
                name: m.tool_name.clone(),
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: t.clone(),
            })
            .collect()
    }

    /// Map a non-200 status to a provider error.
    fn status_error(status: u16, retry_after: Option<u64>, body: String) -> ProviderError {
        match status {
            429 => ProviderError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(5),
            },
            401 | 403 => ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ),
            _ => ProviderError::ApiError {
                status_code: status,
                message: body,
            },
        }
    }
}

#[async_trait]
impl leadbot_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status != 200 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(Self::status_error(status, retry_after, error_body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let model = api_response.model.unwrap_or_else(|| request.model.clone());

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmptyResponse(model.clone()))?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let mut message = Message::assistant(choice.message.content.unwrap_or_default());
        message.tool_calls = tool_calls;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ToolDefinition,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadbot_core::Provider;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(tools: Vec<ToolDefinition>) -> ProviderRequest {
        ProviderRequest {
            model: "gemma2-9b-it".into(),
            messages: vec![Message::system("You are helpful"), Message::user("Hello?")],
            temperature: 0.3,
            max_tokens: Some(1024),
            tools,
        }
    }

    async fn provider_for(status: u16, body: serde_json::Value) -> (MockServer, OpenAiCompatProvider) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        let provider = OpenAiCompatProvider::new("test", server.uri(), "sk-test");
        (server, provider)
    }

    #[test]
    fn groq_constructor() {
        let provider = OpenAiCompatProvider::groq("gsk-test");
        assert_eq!(provider.name(), "groq");
        assert!(provider.base_url.contains("api.groq.com"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("x", "http://localhost:8000/v1/", "k");
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn message_conversion() {
        let call = MessageToolCall {
            id: "call_1".into(),
            name: "get_jobs_list".into(),
            arguments: "{}".into(),
        };
        let mut assistant = Message::assistant("");
        assistant.tool_calls = vec![call.clone()];
        let messages = vec![
            Message::system("You are helpful"),
            Message::user("Any jobs?"),
            assistant,
            Message::tool_result(&call, "[]"),
        ];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 4);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
        assert_eq!(api_messages[2].tool_calls.as_ref().unwrap()[0].function.name, "get_jobs_list");
        assert_eq!(api_messages[3].role, "tool");
        assert_eq!(api_messages[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(api_messages[3].name.as_deref(), Some("get_jobs_list"));
    }

    #[test]
    fn tool_definition_wire_shape() {
        let tools = vec![ToolDefinition {
            name: "get_contact_info".into(),
            description: "Contact details".into(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        }];
        let wire = serde_json::to_value(OpenAiCompatProvider::to_api_tools(&tools)).unwrap();
        assert_eq!(wire[0]["type"], "function");
        assert_eq!(wire[0]["function"]["name"], "get_contact_info");
        assert_eq!(wire[0]["function"]["parameters"]["type"], "object");
    }

    #[tokio::test]
    async fn complete_text_response() {
        let (_server, provider) = provider_for(
            200,
            json!({
                "id": "chatcmpl-1",
                "model": "gemma2-9b-it",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "Hi! How can I help?" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 6, "total_tokens": 18 }
            }),
        )
        .await;

        let response = provider.complete(request(vec![])).await.unwrap();
        assert_eq!(response.message.content, "Hi! How can I help?");
        assert_eq!(response.message.role, Role::Assistant);
        assert!(response.message.tool_calls.is_empty());
        assert_eq!(response.model, "gemma2-9b-it");
        assert_eq!(response.usage.unwrap().total_tokens, 18);
    }

    #[tokio::test]
    async fn complete_tool_request() {
        let (_server, provider) = provider_for(
            200,
            json!({
                "model": "gemma2-9b-it",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc",
                            "type": "function",
                            "function": { "name": "get_job_details", "arguments": "{\"query\":\"2\"}" }
                        }]
                    }
                }]
            }),
        )
        .await;

        let response = provider.complete(request(vec![])).await.unwrap();
        assert_eq!(response.message.content, "");
        assert_eq!(response.message.tool_calls.len(), 1);
        assert_eq!(response.message.tool_calls[0].name, "get_job_details");
        assert_eq!(response.message.tool_calls[0].arguments, "{\"query\":\"2\"}");
    }

    #[tokio::test]
    async fn sends_tools_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gemma2-9b-it",
                "max_tokens": 1024,
                "tools": [{ "type": "function", "function": { "name": "get_services_list" } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "ok" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiCompatProvider::new("test", server.uri(), "sk-test");
        let tools = vec![ToolDefinition {
            name: "get_services_list".into(),
            description: "List services".into(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        }];
        let response = provider.complete(request(tools)).await.unwrap();
        // No model in the body: the requested model is reported
        assert_eq!(response.model, "gemma2-9b-it");
    }

    #[tokio::test]
    async fn empty_choices_is_empty_response() {
        let (_server, provider) = provider_for(200, json!({ "model": "m", "choices": [] })).await;
        let err = provider.complete(request(vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn status_429_is_rate_limited() {
        let (_server, provider) =
            provider_for(429, json!({ "error": { "message": "Rate limit reached" } })).await;
        let err = provider.complete(request(vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
        assert!(err.is_capacity());
    }

    #[tokio::test]
    async fn status_401_is_auth_failure() {
        let (_server, provider) =
            provider_for(401, json!({ "error": { "message": "Invalid API Key" } })).await;
        let err = provider.complete(request(vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
        assert!(!err.is_capacity());
    }

    #[tokio::test]
    async fn over_capacity_body_is_capacity() {
        let (_server, provider) = provider_for(
            503,
            json!({ "error": { "message": "The model is currently over capacity" } }),
        )
        .await;
        let err = provider.complete(request(vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status_code: 503, .. }));
        assert!(err.is_capacity());
    }

    #[tokio::test]
    async fn health_check_hits_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;
        let provider = OpenAiCompatProvider::new("test", server.uri(), "sk-test");
        assert!(provider.health_check().await.unwrap());
    }
}
