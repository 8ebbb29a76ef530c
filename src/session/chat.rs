//! Chat session — drives the per-turn orchestration loop.
//!
//! One session owns one conversation and one set of tool backends. A turn:
//! 1. optional context lookup (failures degrade to "no context"),
//! 2. model call, reply appended and emitted immediately,
//! 3. bounded follow-up sub-loop: ask the model (ephemerally) whether a tool
//!    should run, execute it, feed the result back, emit the next reply,
//!    until the model answers `null`, the reply is not a tool call, or the
//!    round cap is hit.
//!
//! The user only ever sees assistant text: every failure inside a turn is a
//! fallback string, a system-message note, or silent continuation.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::backend::{RegistryView, ToolBackend};
use crate::gateway::ModelClient;
use crate::retrieval::ContextStore;

use super::conversation::Conversation;
use super::errors::SessionError;
use super::prompt;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Maximum tool rounds per turn. Each round needs a genuine "tool requested"
/// signal from the model, but a model stuck requesting tools forever must
/// not hold the turn open indefinitely.
const MAX_TOOL_ROUNDS: u32 = 8;

// ─── Types ───────────────────────────────────────────────────────────────────

/// How a turn's tool sub-loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model signalled no further tool call (or the caller went away).
    Completed,
    /// The round cap was hit while the model still wanted tools.
    ToolLoopExhausted,
}

/// A tool call parsed from a follow-up reply. Lives for one sub-loop round.
#[derive(Debug, Clone, PartialEq)]
struct ToolCallRequest {
    tool: String,
    arguments: Value,
}

/// Parse a follow-up reply into a tool call request.
///
/// `None` means "no tool call": invalid JSON, the literal `null`, a
/// non-object, or an object without a string `tool` field all terminate the
/// sub-loop rather than surfacing an error. A missing `arguments` field
/// defaults to an empty object.
fn parse_tool_call(raw: &str) -> Option<ToolCallRequest> {
    let value: Value = serde_json::from_str(raw.trim()).ok()?;

    let object = value.as_object()?;
    let tool = object.get("tool")?.as_str()?.to_string();
    let arguments = object
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    Some(ToolCallRequest { tool, arguments })
}

/// Log progress for long-running tools that report `{progress, total}`.
fn log_tool_progress(result: &Value) {
    let (Some(progress), Some(total)) = (
        result.get("progress").and_then(Value::as_f64),
        result.get("total").and_then(Value::as_f64),
    ) else {
        return;
    };

    if total > 0.0 {
        tracing::info!(
            progress,
            total,
            percent = format!("{:.1}", progress / total * 100.0),
            "tool reported progress"
        );
    }
}

// ─── ChatSession ─────────────────────────────────────────────────────────────

/// One logical conversation: transcript, tool backends, and the turn loop.
///
/// Sessions are never shared — each inbound conversation gets its own
/// instance (see [`super::manager::SessionManager`]).
pub struct ChatSession {
    model: Arc<dyn ModelClient>,
    backends: Vec<Box<dyn ToolBackend>>,
    context: Option<Arc<dyn ContextStore>>,
    registry: RegistryView,
    /// Present only after successful initialization; holds the transcript.
    conversation: Option<Conversation>,
}

impl ChatSession {
    /// Create a session. Backends are initialized later via [`initialize`].
    ///
    /// [`initialize`]: ChatSession::initialize
    pub fn new(
        model: Arc<dyn ModelClient>,
        backends: Vec<Box<dyn ToolBackend>>,
        context: Option<Arc<dyn ContextStore>>,
    ) -> Self {
        Self {
            model,
            backends,
            context,
            registry: RegistryView::new(),
            conversation: None,
        }
    }

    /// Whether initialization succeeded and turns can be processed.
    pub fn is_ready(&self) -> bool {
        self.conversation.is_some()
    }

    /// The rendered system prompt, once ready.
    pub fn system_prompt(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.system_prompt())
    }

    /// The transcript so far (empty until initialized).
    pub fn messages(&self) -> &[crate::gateway::ChatMessage] {
        self.conversation
            .as_ref()
            .map(|c| c.messages())
            .unwrap_or(&[])
    }

    /// The aggregated registry view.
    pub fn registry(&self) -> &RegistryView {
        &self.registry
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Initialize every backend in order, aggregate their tools, and seed
    /// the conversation with the rendered system prompt.
    ///
    /// Any backend failure aborts initialization: all backends are cleaned
    /// up and the session stays not ready, system prompt unset.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        for index in 0..self.backends.len() {
            let started = self.backends[index].initialize().await;
            if let Err(e) = started {
                let name = self.backends[index].name().to_string();
                tracing::error!(backend = %name, error = %e, "backend initialization failed");
                Self::cleanup_backends(&mut self.backends).await;
                return Err(SessionError::BackendStartup { name, source: e });
            }
        }

        let mut registry = RegistryView::new();
        for index in 0..self.backends.len() {
            let listed = self.backends[index].list_tools().await;
            match listed {
                Ok(descriptors) => registry.register_backend(index, descriptors),
                Err(e) => {
                    let name = self.backends[index].name().to_string();
                    tracing::error!(backend = %name, error = %e, "tool listing failed");
                    Self::cleanup_backends(&mut self.backends).await;
                    return Err(SessionError::BackendStartup { name, source: e });
                }
            }
        }

        tracing::info!(
            backend_count = self.backends.len(),
            tool_count = registry.len(),
            "session initialized"
        );

        let system_prompt = prompt::render_system_prompt(&registry.render_prompt_block());
        self.registry = registry;
        self.conversation = Some(Conversation::new(system_prompt));
        Ok(())
    }

    /// Shut the session down: concurrent, partial-failure-tolerant cleanup
    /// of every backend. The session is no longer ready afterwards.
    pub async fn shutdown(&mut self) {
        Self::cleanup_backends(&mut self.backends).await;
        self.registry = RegistryView::new();
        self.conversation = None;
    }

    /// Cleanup fan-out: every backend's cleanup runs regardless of how the
    /// others fare.
    async fn cleanup_backends(backends: &mut [Box<dyn ToolBackend>]) {
        join_all(backends.iter_mut().map(|b| b.cleanup())).await;
    }

    // ─── Turn Loop ───────────────────────────────────────────────────────

    /// Process one user turn, emitting each assistant reply through
    /// `replies` as soon as it is appended to the transcript.
    ///
    /// The first reply is always emitted, tool activity or not. Subsequent
    /// replies come one per successful tool round.
    pub async fn chat_turn(
        &mut self,
        user_input: &str,
        replies: &mpsc::Sender<String>,
    ) -> Result<TurnOutcome, SessionError> {
        let Self {
            model,
            backends,
            context,
            registry,
            conversation,
        } = self;
        let Some(conversation) = conversation.as_mut() else {
            return Err(SessionError::NotReady);
        };

        if let Some(store) = context {
            augment_with_context(conversation, store.as_ref(), user_input).await;
        }
        conversation.push_user(user_input);

        tracing::info!(input_len = user_input.len(), "processing user turn");

        let first_reply = model.complete(conversation.messages()).await;
        conversation.push_assistant(first_reply.clone());
        if replies.send(first_reply).await.is_err() {
            return Ok(TurnOutcome::Completed);
        }

        Ok(run_tool_rounds(model.as_ref(), backends, registry, conversation, replies).await)
    }
}

/// The bounded follow-up sub-loop for one turn.
async fn run_tool_rounds(
    model: &dyn ModelClient,
    backends: &[Box<dyn ToolBackend>],
    registry: &RegistryView,
    conversation: &mut Conversation,
    replies: &mpsc::Sender<String>,
) -> TurnOutcome {
    for _round in 0..MAX_TOOL_ROUNDS {
        let followup = conversation.with_followup(prompt::FOLLOW_UP_INSTRUCTION);
        let raw = model.complete(&followup).await;

        let Some(request) = parse_tool_call(&raw) else {
            tracing::debug!("no further tool call requested");
            return TurnOutcome::Completed;
        };

        let Some(backend_index) = registry.resolve(&request.tool) else {
            tracing::warn!(tool = %request.tool, "no backend advertises requested tool");
            continue;
        };

        tracing::info!(
            tool = %request.tool,
            backend = %backends[backend_index].name(),
            "executing tool"
        );

        let execution = backends[backend_index]
            .execute_tool(&request.tool, request.arguments.clone())
            .await;
        match execution {
            Ok(result) => {
                log_tool_progress(&result);
                conversation.push_system(format!("{} {result}", prompt::TOOL_RESULT_PREFIX));

                let reply = model.complete(conversation.messages()).await;
                conversation.push_assistant(reply.clone());
                if replies.send(reply).await.is_err() {
                    return TurnOutcome::Completed;
                }
            }
            Err(e) => {
                tracing::warn!(tool = %request.tool, error = %e, "tool execution failed");
                conversation.push_system(format!("Error calling tool {}: {e}", request.tool));
            }
        }
    }

    tracing::warn!(rounds = MAX_TOOL_ROUNDS, "tool round cap hit, ending turn");
    TurnOutcome::ToolLoopExhausted
}

/// Query the context store and append retrieved documents as a system
/// message ahead of the user's own message. Failures are logged and the
/// turn proceeds without context.
async fn augment_with_context(
    conversation: &mut Conversation,
    store: &dyn ContextStore,
    user_input: &str,
) {
    match store.query(user_input).await {
        Ok(documents) if !documents.is_empty() => {
            let joined = documents
                .iter()
                .map(|d| d.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            conversation.push_system(format!("{}\n{joined}", prompt::CONTEXT_PREFIX));
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "context lookup failed, proceeding without context");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
