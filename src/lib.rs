//! toolchat — conversational tool orchestration over pluggable model
//! providers and stdio tool backends.
//!
//! The crate is organized in three layers:
//! - [`gateway`]: one "send conversation, get completion text" operation over
//!   a closed set of HTTP chat-completion providers, with rate-limit-aware
//!   retry and a degraded-text failure mode.
//! - [`backend`]: tool backends — child processes speaking line-delimited
//!   JSON-RPC over stdio — plus the aggregated registry view the orchestrator
//!   resolves tool names against.
//! - [`session`]: the per-turn orchestration loop tying model, tools, and
//!   optional retrieved context together, and the session registry.
//!
//! [`config`] loads environment-driven gateway settings and the JSON servers
//! file; [`retrieval`] defines the context-lookup seam.

pub mod backend;
pub mod config;
pub mod gateway;
pub mod retrieval;
pub mod session;

pub use backend::{BackendError, RegistryView, StdioBackend, ToolBackend};
pub use config::{load_servers_config, ConfigError, GatewaySettings};
pub use gateway::{ChatMessage, GatewayError, ModelClient, ModelGateway, Provider, Role};
pub use retrieval::{ContextDocument, ContextError, ContextStore};
pub use session::{ChatSession, SessionError, SessionManager, TurnOutcome};

/// Initialize the tracing subscriber — structured logs to stderr.
///
/// Filter defaults to `toolchat=info,warn`; override with `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("toolchat=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "toolchat starting"
    );
}
