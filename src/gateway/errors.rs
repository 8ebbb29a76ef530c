//! Model Gateway error types.

use thiserror::Error;

/// Errors that can occur while constructing the gateway or calling a provider.
///
/// `complete` never surfaces these to its caller — terminal failures degrade
/// to the fixed fallback message. They exist for construction-time validation
/// and for the internal retry loop's classification.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The configured provider name is not one of the supported variants.
    #[error("unsupported model provider: '{name}'")]
    UnsupportedProvider {
        name: String,
    },

    /// The provider requires an explicit endpoint and none was configured.
    #[error("provider '{provider}' requires an endpoint to be configured")]
    EndpointRequired {
        provider: String,
    },

    /// Non-2xx HTTP response from the provider.
    #[error("HTTP {status}: {body}")]
    Http {
        status: u16,
        body: String,
    },

    /// TCP/TLS/timeout failure before an HTTP status was received.
    #[error("transport error calling '{provider}': {reason}")]
    Transport {
        provider: String,
        reason: String,
    },

    /// The provider answered 2xx but the completion body had an
    /// unexpected shape.
    #[error("malformed completion response: {reason}")]
    MalformedResponse {
        reason: String,
    },
}

impl GatewayError {
    /// Whether this error is a rate-limit response eligible for retry.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GatewayError::Http { status: 429, .. })
    }

    /// The raw HTTP error body, if this is an `Http` error.
    pub fn http_body(&self) -> Option<&str> {
        match self {
            GatewayError::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}
