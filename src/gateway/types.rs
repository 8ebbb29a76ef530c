//! Shared types for the Model Gateway.
//!
//! These mirror the OpenAI Chat Completions API types, which every supported
//! provider exposes in some form. The conversation orchestrator builds
//! `ChatMessage` sequences and the gateway replays them verbatim on every call.

use serde::{Deserialize, Serialize};

// ─── Messages ────────────────────────────────────────────────────────────────

/// Message role within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation.
///
/// Order within a `Vec<ChatMessage>` is semantically significant — it IS the
/// conversation history and is sent to the provider unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// A fully built provider request: where to POST, with which headers,
/// and what body. Produced by the pure per-provider mapping in
/// [`crate::gateway::ModelGateway::build_request`].
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// Completion response body (the subset we read: `choices[0].message.content`).
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

/// A single completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

/// The message within a completion choice.
///
/// `content` may be absent or `null` on some provider surfaces; both
/// deserialize to `None` and the gateway treats them as empty text.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
