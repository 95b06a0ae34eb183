//! # Leadbot Core
//!
//! Domain types, traits, and error definitions for the Leadbot company
//! assistant. Every seam (LLM backend, tool) is a trait defined here;
//! implementations live in their own crates so tests can swap in scripted
//! stand-ins.

pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use memory::{ConversationMemory, TurnView, DEFAULT_MEMORY_WINDOW};
pub use message::{ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{ParamSpec, Tool, ToolArgs, ToolOutput, ToolRegistry, ToolSchema};
