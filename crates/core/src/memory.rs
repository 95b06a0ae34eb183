//! Conversation memory: a bounded sliding window of past turns.
//!
//! Memory holds only finished exchanges (user turn + assistant answer).
//! Eviction is strict FIFO: the oldest turn goes first, and reading never
//! reorders anything.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use crate::message::{Message, Role};

/// Default number of turns kept.
pub const DEFAULT_MEMORY_WINDOW: usize = 10;

/// External view of one remembered turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub role: Role,
    pub content: String,
}

/// Ordered, capped log of conversation turns.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<Message>,
    capacity: usize,
}

impl ConversationMemory {
    /// Create an empty memory holding at most `capacity` turns.
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a turn, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, message: Message) {
        self.turns.push_back(message);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// Append a finished user/assistant exchange.
    pub fn record_exchange(&mut self, user_text: &str, answer: &str) {
        self.push(Message::user(user_text));
        self.push(Message::assistant(answer));
    }

    /// The remembered turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Message> {
        self.turns.iter()
    }

    /// `{role, content}` pairs, oldest first.
    pub fn view(&self) -> Vec<TurnView> {
        self.turns
            .iter()
            .map(|m| TurnView {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Rewrite the most recent turn if it is an assistant answer.
    ///
    /// Returns `false` and changes nothing when the last turn is not one.
    pub fn replace_last_answer(&mut self, answer: &str) -> bool {
        match self.turns.back_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content = answer.to_string();
                true
            }
            _ => false,
        }
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_WINDOW)
    }
}
