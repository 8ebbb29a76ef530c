//! Tool backends — the "server" capability consumed by the orchestrator.
//!
//! This module handles:
//! - The `ToolBackend` trait the orchestrator programs against
//! - A stdio JSON-RPC backend that spawns a tool server as a child process
//! - Descriptor aggregation and name resolution across backends

use async_trait::async_trait;

pub mod errors;
pub mod registry;
pub mod stdio;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use errors::BackendError;
pub use registry::RegistryView;
pub use stdio::StdioBackend;
pub use types::{ServerConfig, ServersConfig, ToolDescriptor};

/// A tool-serving backend: an external process or service exposing named,
/// schema-described callable operations.
///
/// Backends are initialized sequentially at session startup and may be
/// queried concurrently afterwards. `cleanup` is best-effort — it logs
/// failures instead of raising them, so one backend's bad shutdown never
/// blocks another's.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Human-readable backend name (config key).
    fn name(&self) -> &str;

    /// Establish the connection and discover tools. Must be called before
    /// `list_tools` or `execute_tool`.
    async fn initialize(&mut self) -> Result<(), BackendError>;

    /// The tools this backend advertises.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, BackendError>;

    /// Execute a named tool with the given arguments.
    async fn execute_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, BackendError>;

    /// Release resources. Best-effort: errors are logged, not returned.
    async fn cleanup(&mut self);
}
