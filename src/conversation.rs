//! UI-agnostic conversation state
//!
//! Holds the message history, the unsent draft and the in-flight flag, and
//! enforces the one-request-at-a-time exchange: a submission is accepted
//! only when idle, appends the user's message immediately, and is settled
//! by exactly one assistant message.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::ChatError;

/// Shown when the service replied successfully but without an answer.
pub const NO_ANSWER_PLACEHOLDER: &str = "(No answer returned from backend)";

/// Prepended to every failure description.
pub const FAILURE_PREFIX: &str = "Sorry, I had trouble reaching the service: ";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Default)]
pub struct Conversation {
    history: Vec<ChatMessage>,
    draft: String,
    pending: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True when the send control should be enabled.
    pub fn can_send(&self) -> bool {
        !self.pending && !self.draft.trim().is_empty()
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Insert `c` at char position `cursor`; returns the new cursor.
    pub fn insert_char(&mut self, cursor: usize, c: char) -> usize {
        let byte_pos = char_to_byte_index(&self.draft, cursor);
        self.draft.insert(byte_pos, c);
        cursor + 1
    }

    /// Delete the char before `cursor` (backspace); returns the new cursor.
    pub fn delete_before(&mut self, cursor: usize) -> usize {
        if cursor == 0 {
            return 0;
        }
        let byte_pos = char_to_byte_index(&self.draft, cursor - 1);
        if byte_pos < self.draft.len() {
            self.draft.remove(byte_pos);
        }
        cursor - 1
    }

    /// Delete the char under `cursor`.
    pub fn delete_at(&mut self, cursor: usize) {
        if cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, cursor);
            self.draft.remove(byte_pos);
        }
    }

    /// Accept the current draft for sending.
    ///
    /// Returns the trimmed text the caller must send, or `None` when the
    /// draft is blank or a request is already in flight. In the `None` case
    /// nothing has changed.
    pub fn begin_submit(&mut self) -> Option<String> {
        let trimmed = self.draft.trim();
        if trimmed.is_empty() || self.pending {
            debug!(pending = self.pending, "submission rejected");
            return None;
        }

        let message = trimmed.to_string();
        self.history.push(ChatMessage {
            role: ChatRole::User,
            content: message.clone(),
        });
        self.draft.clear();
        self.pending = true;
        Some(message)
    }

    /// Record how the in-flight request ended.
    ///
    /// Appends exactly one assistant message. `pending` is cleared when the
    /// guard drops, so it is reset even if building the message unwinds.
    pub fn settle(&mut self, outcome: Result<Option<String>, ChatError>) {
        let mut settling = Settling(self);

        let content = match outcome {
            Ok(Some(answer)) => answer,
            Ok(None) => NO_ANSWER_PLACEHOLDER.to_string(),
            Err(err) => {
                warn!(error = %err, "chat request failed");
                format!("{}{}", FAILURE_PREFIX, err)
            }
        };

        settling.history.push(ChatMessage {
            role: ChatRole::Assistant,
            content,
        });
    }
}

/// Clears `pending` on every exit path out of [`Conversation::settle`].
struct Settling<'a>(&'a mut Conversation);

impl Deref for Settling<'_> {
    type Target = Conversation;

    fn deref(&self) -> &Conversation {
        self.0
    }
}

impl DerefMut for Settling<'_> {
    fn deref_mut(&mut self) -> &mut Conversation {
        self.0
    }
}

impl Drop for Settling<'_> {
    fn drop(&mut self) {
        self.0.pending = false;
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
