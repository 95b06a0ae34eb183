//! The agent executor: one user turn, at most two model calls.
//!
//! 1. **Compose** system prompt + remembered turns + the new user turn
//! 2. **First call** with every tool schema attached
//! 3. **Dispatch** the requested tools (unknown names are skipped)
//! 4. **Second call** with the tool results and no tools, if any result exists
//! 5. **Finalize** by recording the exchange in memory
//!
//! A failed attempt is retried from step 1 after a fixed delay. Once the
//! retries are spent the user gets an apology and memory is left untouched.

use leadbot_core::error::ToolError;
use leadbot_core::event::{DomainEvent, EventBus};
use leadbot_core::memory::{ConversationMemory, DEFAULT_MEMORY_WINDOW};
use leadbot_core::message::{ConversationId, Message};
use leadbot_core::tool::ToolRegistry;
use leadbot_providers::{Completion, FallbackChain};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shown when every attempt at a turn failed.
pub const APOLOGY: &str =
    "I'm sorry, I encountered an unexpected error. Please try again or contact our support team.";

/// Why one attempt at a turn failed.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Tool '{tool_name}' failed: {reason}")]
    ToolFailed { tool_name: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// The result of one successful attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnAnswer {
    pub text: String,

    /// Tools whose results were fed back to the model
    pub tools_used: Vec<String>,
}

/// Orchestrates the model and the tool registry for one conversation.
pub struct AgentExecutor {
    llm: Arc<FallbackChain>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    memory: ConversationMemory,
    max_retries: u32,
    retry_delay: Duration,
    conversation_id: ConversationId,
    event_bus: Arc<EventBus>,
}

impl AgentExecutor {
    pub fn new(
        llm: Arc<FallbackChain>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            tools,
            system_prompt: system_prompt.into(),
            memory: ConversationMemory::new(DEFAULT_MEMORY_WINDOW),
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            conversation_id: ConversationId::new(),
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Set how many extra attempts a failed turn gets.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Replace memory with an empty window of `turns` turns.
    pub fn with_memory_window(mut self, turns: usize) -> Self {
        self.memory = ConversationMemory::new(turns);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn with_conversation_id(mut self, id: ConversationId) -> Self {
        self.conversation_id = id;
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Mutable access, for answers produced outside the model path.
    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Answer one user turn. Never fails: exhaustion yields [`APOLOGY`].
    pub async fn invoke(&mut self, user_input: &str) -> String {
        let total_attempts = self.max_retries + 1;
        let mut last_error = String::new();

        info!(
            conversation_id = %self.conversation_id,
            remembered = self.memory.len(),
            "Processing user turn"
        );

        for attempt in 1..=total_attempts {
            match self.attempt(user_input).await {
                Ok(answer) => {
                    self.memory.record_exchange(user_input, &answer.text);
                    self.event_bus.publish(DomainEvent::TurnCompleted {
                        conversation_id: self.conversation_id.to_string(),
                        tools_used: answer.tools_used.len(),
                        attempts: attempt,
                        timestamp: chrono::Utc::now(),
                    });
                    return answer.text;
                }
                Err(e) => {
                    warn!(
                        conversation_id = %self.conversation_id,
                        attempt,
                        total = total_attempts,
                        error = %e,
                        "Turn attempt failed"
                    );
                    last_error = e.to_string();
                    if attempt < total_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        self.event_bus.publish(DomainEvent::TurnFailed {
            conversation_id: self.conversation_id.to_string(),
            error_message: last_error,
            timestamp: chrono::Utc::now(),
        });
        APOLOGY.to_string()
    }

    /// One compose / call / dispatch / call cycle. Memory is not touched.
    async fn attempt(&self, user_input: &str) -> Result<TurnAnswer, TurnError> {
        let mut context = Vec::with_capacity(self.memory.len() + 2);
        context.push(Message::system(&self.system_prompt));
        context.extend(self.memory.turns().cloned());
        context.push(Message::user(user_input));

        let schemas = self.tools.schema_for_all();
        let mut first = match self.llm.invoke(&context, &schemas).await {
            Completion::Reply(response) => response.message,
            unavailable => {
                return Ok(TurnAnswer {
                    text: unavailable.content().to_string(),
                    tools_used: vec![],
                });
            }
        };

        if !first.has_tool_calls() {
            return Ok(TurnAnswer {
                text: first.content,
                tools_used: vec![],
            });
        }

        debug!(count = first.tool_calls.len(), "Model requested tools");

        let mut results = Vec::with_capacity(first.tool_calls.len());
        let mut tools_used = Vec::new();
        for call in &first.tool_calls {
            if !self.tools.contains(&call.name) {
                warn!(tool = %call.name, "Model requested an unregistered tool, skipping");
                continue;
            }

            let args = call.parsed_arguments();
            let start = Instant::now();
            let outcome = self.tools.dispatch(&call.name, args).await;
            self.event_bus.publish(DomainEvent::ToolDispatched {
                tool_name: call.name.clone(),
                success: outcome.is_ok(),
                duration_ms: start.elapsed().as_millis() as u64,
                timestamp: chrono::Utc::now(),
            });

            match outcome {
                Ok(output) => {
                    results.push(Message::tool_result(call, output.to_content()));
                    tools_used.push(call.name.clone());
                }
                Err(ToolError::InvalidArguments(reason)) => {
                    // Let the model explain what is missing
                    warn!(tool = %call.name, reason = %reason, "Tool rejected its arguments");
                    results.push(Message::tool_result(call, format!("Error: {reason}")));
                    tools_used.push(call.name.clone());
                }
                Err(ToolError::NotFound(name)) => {
                    warn!(tool = %name, "Tool disappeared before dispatch, skipping");
                }
                Err(ToolError::ExecutionFailed { tool_name, reason }) => {
                    return Err(TurnError::ToolFailed { tool_name, reason });
                }
                Err(other) => return Err(TurnError::Internal(other.to_string())),
            }
        }

        if results.is_empty() {
            return Ok(TurnAnswer {
                text: first.content,
                tools_used,
            });
        }

        // Every tool call in the assistant turn needs a matching result turn
        first.tool_calls.retain(|call| {
            results
                .iter()
                .any(|r| r.tool_call_id.as_deref() == Some(call.id.as_str()))
        });
        context.push(first);
        context.extend(results);

        let second = self.llm.invoke(&context, &[]).await;
        Ok(TurnAnswer {
            text: second.content().to_string(),
            tools_used,
        })
    }
}
