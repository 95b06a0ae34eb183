//! Conversation turn types.
//!
//! A visitor message arrives → the agent composes context → the provider
//! answers, possibly requesting tools → tool results are fed back as turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (one chat session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instructions
    System,
    /// The website visitor
    User,
    /// The assistant
    Assistant,
    /// Output of a dispatched tool
    ToolResult,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool_result",
        }
    }
}

/// A single turn in a conversation. Immutable once appended anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool invocations requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// For tool results: which invocation this answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// For tool results: which tool produced the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result turn answering `call`.
    pub fn tool_result(call: &MessageToolCall, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::ToolResult, content);
        msg.tool_call_id = Some(call.id.clone());
        msg.tool_name = Some(call.name.clone());
        msg
    }

    /// Whether the assistant asked for any tools in this turn.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A tool-invocation request embedded in an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a raw JSON string, exactly as the model produced them
    pub arguments: String,
}

impl MessageToolCall {
    /// Parse the raw arguments into a JSON object.
    ///
    /// Malformed JSON, or JSON that is not an object, yields an empty object.
    pub fn parsed_arguments(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::from_str::<serde_json::Value>(&self.arguments) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(other) => {
                tracing::warn!(tool = %self.name, got = %other, "Tool arguments are not an object");
                serde_json::Map::new()
            }
            Err(e) => {
                tracing::warn!(tool = %self.name, error = %e, "Failed to parse tool arguments");
                serde_json::Map::new()
            }
        }
    }
}
