//! Tool backend error types.

use thiserror::Error;

/// Errors that can occur while talking to a tool backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server process failed to start.
    #[error("failed to spawn backend '{name}': {reason}")]
    SpawnFailed {
        name: String,
        reason: String,
    },

    /// The initialization handshake failed.
    #[error("backend '{name}' initialization failed: {reason}")]
    InitFailed {
        name: String,
        reason: String,
    },

    /// JSON-RPC communication error (malformed message, I/O error).
    #[error("transport error for backend '{backend}': {reason}")]
    TransportError {
        backend: String,
        reason: String,
    },

    /// The backend returned a JSON-RPC error response.
    #[error("backend error [{code}]: {message}")]
    ServerError {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// A tool call timed out.
    #[error("tool call '{tool}' timed out after {timeout_ms}ms")]
    Timeout {
        tool: String,
        timeout_ms: u64,
    },

    /// Operation attempted before `initialize` succeeded.
    #[error("backend '{name}' not initialized")]
    NotInitialized {
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::Timeout {
            tool: "get_weather".into(),
            timeout_ms: 30_000,
        };
        assert_eq!(
            err.to_string(),
            "tool call 'get_weather' timed out after 30000ms"
        );
    }

    #[test]
    fn test_server_error_display() {
        let err = BackendError::ServerError {
            code: -32601,
            message: "Method not found".into(),
            data: None,
        };
        assert_eq!(err.to_string(), "backend error [-32601]: Method not found");
    }
}
