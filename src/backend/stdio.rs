//! Stdio tool backend — spawns a tool server as a child process and speaks
//! line-delimited JSON-RPC with it.
//!
//! Lifecycle: `initialize` spawns the process and runs the handshake
//! (`initialize`, then `tools/list`); `cleanup` sends a best-effort
//! `shutdown` notification, waits briefly, and force-kills if needed.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};

use super::errors::BackendError;
use super::transport::StdioTransport;
use super::types::{ServerConfig, ToolDescriptor};
use super::ToolBackend;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Timeout for the initialize handshake.
const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single tool call.
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for graceful shutdown before force-killing.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Tool execution attempts before giving up.
const EXECUTE_ATTEMPTS: u32 = 2;

/// Pause between execution attempts.
const EXECUTE_RETRY_DELAY: Duration = Duration::from_secs(1);

// ─── StdioBackend ────────────────────────────────────────────────────────────

/// A tool backend running as a child process with JSON-RPC over stdio.
pub struct StdioBackend {
    name: String,
    config: ServerConfig,
    running: Option<Running>,
}

/// Live process state, present only between `initialize` and `cleanup`.
struct Running {
    process: Child,
    transport: StdioTransport,
    tools: Vec<ToolDescriptor>,
}

/// `tools/list` response payload.
#[derive(Debug, Deserialize)]
struct ToolListResult {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

impl StdioBackend {
    /// Create a backend from its launch configuration. Nothing is spawned
    /// until `initialize`.
    pub fn new(name: &str, config: ServerConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            running: None,
        }
    }

    fn running(&self) -> Result<&Running, BackendError> {
        self.running.as_ref().ok_or(BackendError::NotInitialized {
            name: self.name.clone(),
        })
    }

    /// Spawn the child process with configured args, env, and cwd.
    fn spawn_process(&self) -> Result<Child, BackendError> {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args);

        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        if let Some(dir) = &self.config.cwd {
            cmd.current_dir(dir);
        }

        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::null());

        cmd.spawn().map_err(|e| BackendError::SpawnFailed {
            name: self.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Run the handshake: `initialize` then `tools/list`.
    async fn handshake(&self, tr: &StdioTransport) -> Result<Vec<ToolDescriptor>, BackendError> {
        let init_params = serde_json::json!({
            "protocolVersion": "2024-11-05",
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        tr.request("initialize", Some(init_params))
            .await?
            .into_result()?;

        let result = tr.request("tools/list", None).await?.into_result()?;

        let listed: ToolListResult =
            serde_json::from_value(result).map_err(|e| BackendError::InitFailed {
                name: self.name.clone(),
                reason: format!("failed to parse tools/list response: {e}"),
            })?;

        Ok(listed.tools)
    }

    /// One `tools/call` round-trip under the call timeout.
    async fn call_once(
        &self,
        tool_name: &str,
        arguments: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let running = self.running()?;

        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });

        let response = timeout(CALL_TIMEOUT, running.transport.request("tools/call", Some(params)))
            .await
            .map_err(|_| BackendError::Timeout {
                tool: tool_name.to_string(),
                timeout_ms: CALL_TIMEOUT.as_millis() as u64,
            })??;

        response.into_result()
    }
}

#[async_trait]
impl ToolBackend for StdioBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&mut self) -> Result<(), BackendError> {
        let mut child = self.spawn_process()?;

        let stdin = child.stdin.take().ok_or(BackendError::SpawnFailed {
            name: self.name.clone(),
            reason: "failed to capture stdin".into(),
        })?;
        let stdout = child.stdout.take().ok_or(BackendError::SpawnFailed {
            name: self.name.clone(),
            reason: "failed to capture stdout".into(),
        })?;

        let transport = StdioTransport::new(&self.name, stdin, stdout);

        let tools = match timeout(INIT_TIMEOUT, self.handshake(&transport)).await {
            Ok(Ok(tools)) => tools,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(BackendError::InitFailed {
                    name: self.name.clone(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(BackendError::InitFailed {
                    name: self.name.clone(),
                    reason: format!(
                        "initialization timed out after {}s",
                        INIT_TIMEOUT.as_secs()
                    ),
                });
            }
        };

        tracing::info!(
            backend = %self.name,
            tool_count = tools.len(),
            "backend initialized"
        );

        self.running = Some(Running {
            process: child,
            transport,
            tools,
        });
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        Ok(self.running()?.tools.clone())
    }

    async fn execute_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        self.running()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call_once(tool_name, &arguments).await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < EXECUTE_ATTEMPTS => {
                    tracing::warn!(
                        backend = %self.name,
                        tool = tool_name,
                        attempt,
                        error = %e,
                        "tool execution failed, retrying"
                    );
                    sleep(EXECUTE_RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn cleanup(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };

        if let Err(e) = running.transport.notify("shutdown", None).await {
            tracing::debug!(backend = %self.name, error = %e, "shutdown notification failed");
        }

        match timeout(SHUTDOWN_TIMEOUT, running.process.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(backend = %self.name, %status, "backend exited");
            }
            _ => {
                tracing::warn!(backend = %self.name, "graceful shutdown failed, killing process");
                let _ = running.process.kill().await;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn backend() -> StdioBackend {
        StdioBackend::new(
            "weather",
            ServerConfig {
                command: "definitely-not-a-real-binary".into(),
                args: vec![],
                env: HashMap::new(),
                cwd: None,
            },
        )
    }

    #[tokio::test]
    async fn test_list_tools_before_initialize() {
        let b = backend();
        let err = b.list_tools().await.unwrap_err();
        assert!(matches!(err, BackendError::NotInitialized { name } if name == "weather"));
    }

    #[tokio::test]
    async fn test_execute_before_initialize() {
        let b = backend();
        let err = b
            .execute_tool("get_weather", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn test_initialize_spawn_failure() {
        let mut b = backend();
        let err = b.initialize().await.unwrap_err();
        assert!(matches!(err, BackendError::SpawnFailed { .. }));
        // Cleanup on a never-started backend is a no-op.
        b.cleanup().await;
    }

    #[test]
    fn test_tool_list_result_parse() {
        let result: ToolListResult = serde_json::from_value(serde_json::json!({
            "tools": [
                {"name": "get_weather", "description": "d", "inputSchema": {}}
            ]
        }))
        .unwrap();
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].name, "get_weather");
    }
}
