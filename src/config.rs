//! Configuration loading.
//!
//! Gateway settings come from environment variables; tool backend servers
//! come from a JSON file with `${VAR}` / `${VAR:-default}` interpolation so
//! secrets and machine-local paths stay out of the file itself.

use std::path::Path;

use thiserror::Error;

use crate::backend::types::ServersConfig;

/// Configuration loading or validation error.
#[derive(Debug, Error)]
#[error("config error: {reason}")]
pub struct ConfigError {
    pub reason: String,
}

// ─── Gateway Settings ────────────────────────────────────────────────────────

/// Model provider settings, read once at startup.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Provider name (`openai`, `bedrock`, `vertex`, `azure`, `ollama`).
    pub provider: String,
    /// API key; optional because local providers need none.
    pub api_key: Option<String>,
    /// Model (or Azure deployment) name.
    pub model: String,
    /// Endpoint override. Required for Azure and Vertex.
    pub endpoint: Option<String>,
}

impl GatewaySettings {
    /// Read settings from `LLM_PROVIDER`, `LLM_API_KEY`, `LLM_MODEL`, and
    /// `LLM_ENDPOINT`.
    pub fn from_env() -> Self {
        Self {
            provider: std::env::var("LLM_PROVIDER")
                .unwrap_or_else(|_| "openai".to_string())
                .to_lowercase(),
            api_key: std::env::var("LLM_API_KEY").ok(),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            endpoint: std::env::var("LLM_ENDPOINT").ok(),
        }
    }

    /// The API key, or a config error naming the missing variable.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or_else(|| ConfigError {
            reason: "LLM_API_KEY not set".into(),
        })
    }
}

// ─── Servers Config ──────────────────────────────────────────────────────────

/// Load the tool backend servers configuration from a JSON file.
///
/// String values support `${VAR}` and `${VAR:-default}` interpolation,
/// applied to the raw text before parsing.
pub fn load_servers_config(path: &Path) -> Result<ServersConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    let interpolated = interpolate_env_vars(&raw);

    serde_json::from_str(&interpolated).map_err(|e| ConfigError {
        reason: format!("failed to parse {}: {e}", path.display()),
    })
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
