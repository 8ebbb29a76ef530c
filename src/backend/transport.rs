//! JSON-RPC over stdio transport.
//!
//! Low-level communication with a tool server: requests go out as one JSON
//! object per line, responses come back the same way. Servers are allowed to
//! write log noise to stdout; the read loop scans for the line carrying the
//! awaited request id and skips everything else.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::Mutex;

use super::errors::BackendError;
use super::types::{JsonRpcRequest, JsonRpcResponse};

/// Bi-directional JSON-RPC transport over a pair of byte streams.
///
/// Generic over the stream halves; production code uses the child-process
/// defaults, tests drive it through in-memory pipes. Request ids are
/// monotonic per transport, so ids never collide within one connection and
/// restarted backends start counting fresh.
pub struct StdioTransport<W = ChildStdin, R = ChildStdout> {
    backend_name: String,
    next_id: AtomicU64,
    writer: Mutex<W>,
    reader: Mutex<BufReader<R>>,
}

impl<W, R> StdioTransport<W, R>
where
    W: AsyncWrite + Unpin + Send,
    R: AsyncRead + Unpin + Send,
{
    pub fn new(backend_name: &str, writer: W, reader: R) -> Self {
        Self {
            backend_name: backend_name.to_string(),
            next_id: AtomicU64::new(1),
            writer: Mutex::new(writer),
            reader: Mutex::new(BufReader::new(reader)),
        }
    }

    fn transport_error(&self, reason: String) -> BackendError {
        BackendError::TransportError {
            backend: self.backend_name.clone(),
            reason,
        }
    }

    /// Serialize one message and write it as a single newline-terminated line.
    async fn write_line<T: Serialize>(&self, message: &T, what: &str) -> Result<(), BackendError> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| self.transport_error(format!("failed to serialize {what}: {e}")))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.transport_error(format!("failed to write {what}: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| self.transport_error(format!("failed to flush {what}: {e}")))
    }

    /// Send a JSON-RPC request and wait for the matching response.
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, BackendError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.write_line(&JsonRpcRequest::new(id, method, params), "request")
            .await?;
        self.read_response(id).await
    }

    /// Scan incoming lines for the response carrying `id`.
    ///
    /// Anything else on the stream — server log output, blank lines, stale
    /// responses — is counted and skipped.
    async fn read_response(&self, id: u64) -> Result<JsonRpcResponse, BackendError> {
        let mut reader = self.reader.lock().await;
        let mut line = String::new();
        let mut skipped: u32 = 0;

        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .await
                .map_err(|e| self.transport_error(format!("failed to read response: {e}")))?;

            if bytes_read == 0 {
                return Err(self.transport_error(format!(
                    "stream closed while awaiting response {id} (server may have exited)"
                )));
            }

            let candidate = line.trim();
            if candidate.is_empty() {
                continue;
            }

            if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(candidate) {
                if response.id == id {
                    if skipped > 0 {
                        tracing::trace!(
                            backend = %self.backend_name,
                            skipped,
                            "skipped non-matching lines before response"
                        );
                    }
                    return Ok(response);
                }
            }
            skipped += 1;
        }
    }

    /// Send a JSON-RPC notification: no id, no response expected.
    pub async fn notify(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), BackendError> {
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        self.write_line(&notification, "notification").await
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
