//! Conversation transcript — the ordered, append-only message history.
//!
//! The transcript is replayed verbatim on every model call, so order is
//! semantics. Mutation is strictly additive: messages are appended within a
//! turn, never edited or reordered. Tool-call JSON is an internal signal and
//! never lands in an assistant-role entry.

use crate::gateway::types::ChatMessage;

/// An append-only conversation seeded with one system message.
#[derive(Debug, Clone)]
pub struct Conversation {
    system_prompt: String,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Create a conversation seeded with the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        let messages = vec![ChatMessage::system(system_prompt.clone())];
        Self {
            system_prompt,
            messages,
        }
    }

    /// The rendered system prompt this conversation was seeded with.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// The full ordered history.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages, including the seed system message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript holds no messages. Seeding puts a system
    /// message in first, so a constructed conversation is never empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Append a system message (context, tool results, tool errors).
    pub fn push_system(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::system(content));
    }

    /// The history plus one ephemeral trailing system instruction.
    ///
    /// Used for follow-up "should a tool run now" calls — the instruction is
    /// never persisted into the transcript.
    pub fn with_followup(&self, instruction: &str) -> Vec<ChatMessage> {
        let mut messages = self.messages.clone();
        messages.push(ChatMessage::system(instruction));
        messages
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
