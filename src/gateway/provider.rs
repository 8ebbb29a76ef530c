//! Provider variants and per-provider request construction.
//!
//! Providers form a closed set selected once at gateway construction.
//! Adding a provider means adding a variant here — the call sites in
//! `client.rs` never branch on provider names.

use std::str::FromStr;

use serde_json::json;

use super::errors::GatewayError;
use super::types::{ChatMessage, ProviderRequest};

// ─── Defaults ────────────────────────────────────────────────────────────────

/// Sampling temperature sent to OpenAI-style completion endpoints.
const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Completion token ceiling sent to OpenAI-style completion endpoints.
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Azure Chat Completions API version pinned by the request URL.
const AZURE_API_VERSION: &str = "2024-02-15-preview";

// ─── Provider ────────────────────────────────────────────────────────────────

/// The supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI or any OpenAI-compatible endpoint.
    OpenAi,
    /// AWS Bedrock via its OpenAI-compatible completion surface.
    Bedrock,
    /// GCP Vertex AI via its OpenAI-compatible completion surface.
    Vertex,
    /// Azure OpenAI deployments.
    Azure,
    /// Local Ollama daemon.
    Ollama,
}

impl Provider {
    /// Lowercase name used in config and log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Bedrock => "bedrock",
            Provider::Vertex => "vertex",
            Provider::Azure => "azure",
            Provider::Ollama => "ollama",
        }
    }

    /// Default endpoint URL, for providers that have one.
    ///
    /// Azure and Vertex have no meaningful default — their URLs embed a
    /// resource or project name, so an explicit endpoint is required.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            Provider::Ollama => Some("http://localhost:11434/v1/chat/completions"),
            Provider::Bedrock => {
                Some("https://bedrock-runtime.us-east-1.amazonaws.com/openai/v1/chat/completions")
            }
            Provider::Azure | Provider::Vertex => None,
        }
    }

    /// Whether this provider cannot operate without a configured endpoint.
    pub fn requires_endpoint(&self) -> bool {
        self.default_endpoint().is_none()
    }
}

impl FromStr for Provider {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "bedrock" => Ok(Provider::Bedrock),
            "vertex" => Ok(Provider::Vertex),
            "azure" => Ok(Provider::Azure),
            "ollama" => Ok(Provider::Ollama),
            other => Err(GatewayError::UnsupportedProvider {
                name: other.to_string(),
            }),
        }
    }
}

// ─── Request Construction ────────────────────────────────────────────────────

/// Build the outbound request for one provider: URL, headers, and a payload
/// carrying the full message sequence. Pure — no I/O, no shared state.
///
/// `endpoint` is the configured override; when `None` the provider default
/// applies. Callers have already validated that endpoint-requiring providers
/// have one (see `ModelGateway::new`), so a missing endpoint here falls back
/// to an empty URL only in unreachable paths.
pub fn build_request(
    provider: Provider,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    model: &str,
    messages: &[ChatMessage],
) -> ProviderRequest {
    let base = endpoint
        .or(provider.default_endpoint())
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string();

    match provider {
        Provider::OpenAi | Provider::Bedrock | Provider::Vertex => ProviderRequest {
            url: base,
            headers: bearer_headers(api_key),
            body: json!({
                "model": model,
                "messages": messages,
                "temperature": DEFAULT_TEMPERATURE,
                "max_tokens": DEFAULT_MAX_TOKENS,
            }),
        },
        Provider::Azure => ProviderRequest {
            // The deployment name doubles as the model, so the body omits it.
            url: format!(
                "{base}/openai/deployments/{model}/chat/completions?api-version={AZURE_API_VERSION}"
            ),
            headers: vec![("api-key", api_key.unwrap_or_default().to_string())],
            body: json!({
                "messages": messages,
                "temperature": DEFAULT_TEMPERATURE,
                "max_tokens": DEFAULT_MAX_TOKENS,
            }),
        },
        Provider::Ollama => ProviderRequest {
            url: base,
            headers: Vec::new(),
            body: json!({
                "model": model,
                "messages": messages,
            }),
        },
    }
}

/// `Authorization: Bearer …` headers, omitted entirely when no key is set.
fn bearer_headers(api_key: Option<&str>) -> Vec<(&'static str, String)> {
    match api_key {
        Some(key) => vec![("Authorization", format!("Bearer {key}"))],
        None => Vec::new(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
