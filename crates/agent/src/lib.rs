//! The Leadbot agent.
//!
//! A visitor message flows through [`ChatSession`] first: greetings, form
//! submissions and keyword fast paths are answered there. Everything else
//! goes to the [`AgentExecutor`], which runs the model with the company
//! tools and keeps the conversation memory:
//!
//! 1. **Compose** system prompt + memory + user turn
//! 2. **Call** the model with every tool schema
//! 3. **Dispatch** any requested tools
//! 4. **Call** again with the tool results to get the final answer
//! 5. **Remember** the exchange (last 10 turns)

pub mod executor;
pub mod fast_path;
pub mod prompt;
pub mod session;

pub use executor::{APOLOGY, AgentExecutor, TurnAnswer, TurnError};
pub use fast_path::{FastPathAction, FastPathRouter, FastPathRule, Topic};
pub use prompt::system_prompt;
pub use session::{ChatSession, FormSubmission};

use leadbot_config::AppConfig;
use leadbot_core::event::EventBus;
use leadbot_core::tool::ToolRegistry;
use leadbot_providers::FallbackChain;
use std::sync::Arc;
use std::time::Duration;

/// Build a fresh session wired from configuration.
///
/// `llm` and `tools` are shared across sessions; memory is per session.
pub fn session_from_config(
    config: &AppConfig,
    llm: Arc<FallbackChain>,
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
) -> ChatSession {
    let company = Arc::new(config.company.clone());
    let prompt = config
        .agent
        .system_prompt
        .clone()
        .unwrap_or_else(|| system_prompt(&company));

    let executor = AgentExecutor::new(llm, tools, prompt)
        .with_max_retries(config.agent.max_retries)
        .with_retry_delay(Duration::from_millis(config.agent.retry_delay_ms))
        .with_memory_window(config.agent.memory_window)
        .with_event_bus(event_bus);

    ChatSession::new(executor, company).with_settings(&config.agent)
}
