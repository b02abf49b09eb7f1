//! Bounded conversation history.

use std::collections::VecDeque;

use ragdesk_core::Message;

/// Default number of messages kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A FIFO of the most recent messages.
///
/// Once `capacity` messages are stored, each push drops the oldest one.
/// Order is always preserved.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    capacity: usize,
    messages: VecDeque<Message>,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ConversationHistory {
    /// Create an empty history. A capacity of zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, messages: VecDeque::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        if self.capacity == 0 {
            return;
        }
        while self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Stored messages, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
