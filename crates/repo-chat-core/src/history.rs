//! Conversation history as a bounded window of completed turns.
//!
//! Turns are appended in chronological order and never reordered. When a
//! turn limit is set, the oldest turn is evicted once the window is full,
//! which keeps the rendered prompt from growing without bound.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default number of turns kept in the prompt.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Ring buffer of the most recent turns.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<Turn>,
    /// `None` keeps every turn.
    max_turns: Option<usize>,
    total_turns: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }
}

impl ConversationHistory {
    /// Keep at most `max_turns` turns; `0` keeps every turn.
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns: (max_turns > 0).then_some(max_turns),
            total_turns: 0,
        }
    }

    /// Record a completed turn.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        if let Some(max) = self.max_turns {
            while self.turns.len() >= max {
                self.turns.pop_front();
            }
        }
        self.turns.push_back(Turn {
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        });
        self.total_turns += 1;
    }

    /// Render retained turns as `Question: …\nAnswer: …\n` blocks, oldest
    /// first. Empty history renders as an empty string.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("Question: {}\nAnswer: {}\n", t.question, t.answer))
            .collect()
    }

    /// Turns currently retained.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns appended over the session's lifetime, including evicted ones.
    pub fn total_turns(&self) -> usize {
        self.total_turns
    }

    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }
}
