//! Registry view — read-only aggregation of tool descriptors across backends.
//!
//! Built in one pass at session initialization. Provides:
//! - The full descriptor list, backend order preserved
//! - Resolution of a requested tool name to the backend that owns it
//! - The rendered tool block for the system prompt

use super::types::ToolDescriptor;

/// One aggregated descriptor with the index of the backend that advertised it.
#[derive(Debug, Clone)]
struct RegistryEntry {
    backend_index: usize,
    descriptor: ToolDescriptor,
}

/// Read-only aggregation of tool descriptors across all backends.
///
/// Tool name uniqueness across backends is not enforced: `resolve` returns
/// the first backend (in registration order) advertising the name, and
/// duplicates are logged at registration time.
#[derive(Debug, Clone, Default)]
pub struct RegistryView {
    entries: Vec<RegistryEntry>,
}

impl RegistryView {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one backend's descriptors, preserving their order.
    pub fn register_backend(&mut self, backend_index: usize, descriptors: Vec<ToolDescriptor>) {
        for descriptor in descriptors {
            if let Some(owner) = self.resolve(&descriptor.name) {
                tracing::warn!(
                    tool = %descriptor.name,
                    first_backend = owner,
                    shadowed_backend = backend_index,
                    "duplicate tool name across backends, first registration wins"
                );
            }
            self.entries.push(RegistryEntry {
                backend_index,
                descriptor,
            });
        }
    }

    /// All aggregated descriptors, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Resolve a tool name to the index of the owning backend.
    ///
    /// First match wins when several backends advertise the same name.
    pub fn resolve(&self, tool_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.descriptor.name == tool_name)
            .map(|e| e.backend_index)
    }

    /// Render all descriptors for the system prompt, joined by newlines,
    /// order-preserving.
    pub fn render_prompt_block(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.descriptor.prompt_block())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of aggregated descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no descriptors are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
