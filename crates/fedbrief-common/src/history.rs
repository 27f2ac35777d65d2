//! Rolling conversation history.
//!
//! One process-wide buffer of past turns, bounded to the most recent
//! [`MAX_HISTORY_MESSAGES`] entries. The per-turn system instruction is
//! synthesized fresh on every backend call and never stored here, so the
//! buffer only ever holds user and assistant messages. The buffer is not
//! partitioned per session; callers share it behind a mutex and keep the
//! append-plus-truncate step inside a single lock scope.

use crate::chat::Message;

/// Maximum number of messages retained after a turn completes.
pub const MAX_HISTORY_MESSAGES: usize = 20;

/// Bounded, append-only-within-a-turn conversation buffer.
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: Vec<Message>,
    capacity: usize,
}

impl History {
    /// Creates an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_MESSAGES)
    }

    /// Creates an empty history retaining at most `capacity` messages.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::new(),
            capacity,
        }
    }

    /// The retained messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of retained messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Clones the retained messages for use as a prompt prefix.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Records one completed turn: the user message followed by the
    /// assistant reply, then truncation to capacity (oldest dropped first).
    pub fn record_turn(&mut self, user: Message, assistant: Message) {
        self.messages.push(user);
        self.messages.push(assistant);
        self.truncate_to_capacity();
    }

    fn truncate_to_capacity(&mut self) {
        if self.messages.len() > self.capacity {
            let excess = self.messages.len() - self.capacity;
            self.messages.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::chat::MessageRole;

    fn record(history: &mut History, turn: usize) {
        history.record_turn(
            Message::user(format!("question {turn}")),
            Message::assistant(format!("answer {turn}")),
        );
    }

    #[test]
    fn test_empty_history() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
    }

    #[test]
    fn test_turns_append_in_order() {
        let mut history = History::new();
        record(&mut history, 1);
        record(&mut history, 2);

        let messages = history.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "question 1");
        assert_eq!(messages[3].role, MessageRole::Assistant);
        assert_eq!(messages[3].content, "answer 2");
    }

    #[test]
    fn test_truncation_boundary() {
        let mut history = History::new();

        // Ten turns fill the buffer exactly; nothing is dropped yet.
        for turn in 1..=10 {
            record(&mut history, turn);
        }
        assert_eq!(history.len(), MAX_HISTORY_MESSAGES);
        assert_eq!(history.messages()[0].content, "question 1");

        // The eleventh turn pushes the oldest pair out.
        record(&mut history, 11);
        assert_eq!(history.len(), MAX_HISTORY_MESSAGES);
        assert_eq!(history.messages()[0].content, "question 2");
        assert_eq!(
            history.messages().last().unwrap().content,
            "answer 11"
        );
    }

    #[test]
    fn test_oldest_dropped_first() {
        let mut history = History::with_capacity(4);
        for turn in 1..=3 {
            record(&mut history, turn);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.messages()[0].content, "question 2");
        assert_eq!(history.messages()[1].content, "answer 2");
    }
}
