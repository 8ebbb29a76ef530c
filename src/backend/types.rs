//! Shared types for tool backends.
//!
//! JSON-RPC 2.0 message types, tool descriptors, and server configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::BackendError;

// ─── JSON-RPC 2.0 ───────────────────────────────────────────────────────────

/// JSON-RPC 2.0 request message. The version marker is fixed, so it is not
/// part of the construction surface.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response message (success or error). Only the fields the
/// transport acts on are retained; the version marker is not one of them.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub id: u64,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// The result payload, with a JSON-RPC error object converted to
    /// [`BackendError::ServerError`]. A response carrying neither result
    /// nor error is itself treated as a server error.
    pub fn into_result(self) -> Result<serde_json::Value, BackendError> {
        if let Some(err) = self.error {
            return Err(BackendError::ServerError {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        self.result.ok_or(BackendError::ServerError {
            code: -32603,
            message: "response carried neither result nor error".into(),
            data: None,
        })
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

// ─── Tool Descriptors ────────────────────────────────────────────────────────

/// A tool advertised by a backend: name, description, and input schema.
///
/// Immutable once fetched. Name uniqueness across backends is not enforced —
/// the registry resolves collisions first-match-wins and warns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    /// Render this descriptor for the system prompt.
    ///
    /// Pure and deterministic: name, description, then one line per schema
    /// property with a `(required)` marker where the schema demands it.
    pub fn prompt_block(&self) -> String {
        let mut args_desc = Vec::new();

        if let Some(properties) = self
            .input_schema
            .get("properties")
            .and_then(|p| p.as_object())
        {
            let required: Vec<&str> = self
                .input_schema
                .get("required")
                .and_then(|r| r.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();

            for (param_name, param_info) in properties {
                let description = param_info
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("No description");
                let mut line = format!("- {param_name}: {description}");
                if required.contains(&param_name.as_str()) {
                    line.push_str(" (required)");
                }
                args_desc.push(line);
            }
        }

        format!(
            "Tool: {}\nDescription: {}\nArguments:\n{}",
            self.name,
            self.description,
            args_desc.join("\n")
        )
    }
}

// ─── Server Configuration ────────────────────────────────────────────────────

/// One stdio server's launch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Working directory for the server process.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Top-level servers configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServersConfig {
    pub servers: HashMap<String, ServerConfig>,
}

impl ServersConfig {
    /// Server entries in fixed, deterministic startup order (by name).
    pub fn in_start_order(&self) -> Vec<(&str, &ServerConfig)> {
        let mut entries: Vec<(&str, &ServerConfig)> = self
            .servers
            .iter()
            .map(|(name, cfg)| (name.as_str(), cfg))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
