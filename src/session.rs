//! In-memory conversation history for the running process.
//!
//! Insertion order is conversation order is wire order. The store does not
//! validate role alternation; tool-call/tool-result interleaving is the
//! caller's responsibility.

use crate::message::Message;

/// Ordered, append-only message history with explicit rollback.
#[derive(Debug, Clone, Default)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop the most recent message. No-op on an empty session.
    pub fn remove_last(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Remove trailing messages until at most `len` remain.
    pub fn truncate_to(&mut self, len: usize) {
        while self.messages.len() > len {
            self.remove_last();
        }
    }

    /// Read-only view of the history in insertion order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
