//! Tool trait: the abstraction over the assistant's capabilities.
//!
//! Tools are what let the assistant answer from real data and record leads:
//! list services, look up a job, submit an inquiry, and so on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Named arguments passed to a tool.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    /// JSON Schema type name ("string", "integer", ...)
    #[serde(rename = "type")]
    pub kind: String,

    pub description: String,

    pub required: bool,
}

/// The input contract of a tool: an ordered list of named parameters.
///
/// A tool that takes no input declares `ToolSchema::empty()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a required parameter.
    pub fn required(mut self, name: &str, kind: &str, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind: kind.into(),
            description: description.into(),
            required: true,
        });
        self
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: &str, kind: &str, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind: kind.into(),
            description: description.into(),
            required: false,
        });
        self
    }

    /// Names of the required parameters, in declaration order.
    pub fn required_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Required parameters absent from (or null in) `args`.
    pub fn missing_required(&self, args: &ToolArgs) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.required)
            .filter(|p| args.get(&p.name).is_none_or(|v| v.is_null()))
            .map(|p| p.name.clone())
            .collect()
    }

    /// Render as the function-calling `parameters` object.
    pub fn to_json(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({ "type": p.kind, "description": p.description }),
                )
            })
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names(),
        })
    }
}

/// What a tool handler returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutput {
    /// Human-readable text, passed to the model verbatim
    Text(String),
    /// Structured data, serialized as JSON for the model
    Structured(serde_json::Value),
}

impl ToolOutput {
    /// Content for a `tool_result` turn.
    pub fn to_content(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Structured(value) => value.to_string(),
        }
    }

    /// The structured value, if this output carries one.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            ToolOutput::Structured(value) => Some(value),
            ToolOutput::Text(_) => None,
        }
    }
}

impl From<serde_json::Value> for ToolOutput {
    fn from(value: serde_json::Value) -> Self {
        ToolOutput::Structured(value)
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}

/// The core Tool trait.
///
/// Each company tool implements this trait and is registered once in the
/// `ToolRegistry` at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_services_list").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// The named parameters this tool accepts.
    fn input_schema(&self) -> ToolSchema;

    /// Run the tool with named arguments.
    async fn invoke(&self, args: ToolArgs) -> std::result::Result<ToolOutput, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema().to_json(),
        }
    }
}

/// A registry of available tools.
///
/// Serves the agent twice: as the schema list sent to the LLM, and as the
/// dispatch table when the LLM requests an invocation. The registry performs
/// no side effects of its own.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Fails if a tool with the same name already exists.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Schemas for every tool, in registration order.
    pub fn schema_for_all(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Invoke a tool by name, returning the handler's result unchanged.
    pub async fn dispatch(
        &self,
        name: &str,
        args: ToolArgs,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.invoke(args).await
    }

    /// All registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn input_schema(&self) -> ToolSchema {
            ToolSchema::empty()
                .required("text", "string", "Text to echo")
                .optional("shout", "boolean", "Upper-case the reply")
        }
        async fn invoke(&self, args: ToolArgs) -> std::result::Result<ToolOutput, ToolError> {
            Ok(ToolOutput::Structured(serde_json::Value::Object(args)))
        }
    }

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn name(&self) -> &str { "ping" }
        fn description(&self) -> &str { "Replies pong" }
        fn input_schema(&self) -> ToolSchema { ToolSchema::empty() }
        async fn invoke(&self, _args: ToolArgs) -> std::result::Result<ToolOutput, ToolError> {
            Ok(ToolOutput::Text("pong".into()))
        }
    }

    fn args(value: serde_json::Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ToolError::Duplicate(ref n) if n == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schema_shape_matches_function_calling() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        registry.register(Box::new(PingTool)).unwrap();

        let defs = registry.schema_for_all();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[1].name, "ping");

        let params = &defs[0].parameters;
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["text"]["type"], "string");
        assert_eq!(params["properties"]["shout"]["description"], "Upper-case the reply");
        assert_eq!(params["required"], serde_json::json!(["text"]));

        let empty = &defs[1].parameters;
        assert_eq!(empty["properties"], serde_json::json!({}));
        assert_eq!(empty["required"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn dispatch_returns_handler_output_unchanged() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        registry.register(Box::new(PingTool)).unwrap();

        let input = args(serde_json::json!({"text": "hello world", "n": [1, 2]}));
        let out = registry.dispatch("echo", input.clone()).await.unwrap();
        assert_eq!(out, ToolOutput::Structured(serde_json::Value::Object(input)));

        let out = registry.dispatch("ping", ToolArgs::new()).await.unwrap();
        assert_eq!(out, ToolOutput::Text("pong".into()));
    }

    #[tokio::test]
    async fn dispatch_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.dispatch("nonexistent", ToolArgs::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn missing_required_ignores_optional_and_flags_null() {
        let schema = EchoTool.input_schema();
        assert_eq!(schema.missing_required(&ToolArgs::new()), vec!["text".to_string()]);
        assert_eq!(
            schema.missing_required(&args(serde_json::json!({"text": null}))),
            vec!["text".to_string()]
        );
        assert!(schema.missing_required(&args(serde_json::json!({"text": "x"}))).is_empty());
    }

    #[test]
    fn output_content_rendering() {
        assert_eq!(ToolOutput::Text("plain".into()).to_content(), "plain");
        let structured = ToolOutput::from(serde_json::json!({"status": "success"}));
        assert_eq!(structured.to_content(), r#"{"status":"success"}"#);
    }
}
