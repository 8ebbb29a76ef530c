//! Conversation sessions — the orchestration layer.
//!
//! This module handles:
//! - The per-turn loop tying model, tools, and context together
//! - The append-only conversation transcript
//! - Prompt templates (system prompt, follow-up instruction)
//! - Session registry with idle eviction

pub mod chat;
pub mod conversation;
pub mod errors;
pub mod manager;
pub mod prompt;

// Re-exports for convenience
pub use chat::{ChatSession, TurnOutcome};
pub use conversation::Conversation;
pub use errors::SessionError;
pub use manager::SessionManager;
