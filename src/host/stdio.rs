//! Stdio JSON-RPC tool host client.
//!
//! Spawns the configured subprocess and speaks newline-delimited JSON-RPC 2.0
//! over its stdin/stdout: `initialize` handshake, then `tools/list` and
//! `tools/call`. Requests are strictly sequential; responses are matched by
//! id and server-initiated traffic is skipped. The child's stderr is
//! forwarded to tracing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::host::ToolHost;
use crate::tools::Tool;
use crate::types::{Error, Result, ToolHostSpec};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// Tool host reached by spawning a subprocess.
#[derive(Debug)]
pub struct StdioToolHost {
    spec: ToolHostSpec,
    request_timeout: Duration,
    connection: Option<Connection>,
    next_id: u64,
}

#[derive(Debug)]
struct Connection {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl StdioToolHost {
    pub fn new(spec: ToolHostSpec, request_timeout: Duration) -> Self {
        Self {
            spec,
            request_timeout,
            connection: None,
            next_id: 0,
        }
    }

    fn spawn(&self) -> Result<Connection> {
        let mut child = Command::new(&self.spec.command)
            .args(&self.spec.args)
            .envs(&self.spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::connection(format!("cannot spawn '{}': {}", self.spec.command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::connection("tool host stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .map(|out| BufReader::new(out).lines())
            .ok_or_else(|| Error::connection("tool host stdout unavailable"))?;

        // Hosts log free-form text on stderr; forward it instead of mixing it
        // into the terminal.
        if let Some(stderr) = child.stderr.take() {
            let command = self.spec.command.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(host = %command, "{}", line);
                }
            });
        }

        Ok(Connection {
            child,
            stdin,
            stdout,
        })
    }

    async fn write_frame(&mut self, frame: &Value) -> Result<()> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| Error::connection("tool host not connected"))?;
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');
        connection
            .stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::connection(format!("write to tool host failed: {}", e)))?;
        connection
            .stdin
            .flush()
            .await
            .map_err(|e| Error::connection(format!("write to tool host failed: {}", e)))?;
        Ok(())
    }

    /// Send one request and wait for its response, skipping unrelated frames.
    async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        let request_timeout = self.request_timeout;
        self.write_frame(&request_frame(id, method, params)).await?;

        let wait = async {
            let connection = self
                .connection
                .as_mut()
                .ok_or_else(|| Error::connection("tool host not connected"))?;
            loop {
                let line = connection
                    .stdout
                    .next_line()
                    .await
                    .map_err(|e| Error::connection(format!("read from tool host failed: {}", e)))?
                    .ok_or_else(|| Error::connection("tool host closed the connection"))?;
                if line.trim().is_empty() {
                    continue;
                }
                let frame: Value = match serde_json::from_str(&line) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping unparseable frame from tool host");
                        continue;
                    }
                };
                if frame.get("id").and_then(Value::as_u64) != Some(id) {
                    // Server notification or request; not ours to answer.
                    tracing::debug!(method = ?frame.get("method"), "skipping host-initiated frame");
                    continue;
                }
                if let Some(error) = frame.get("error") {
                    let message = error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unspecified error");
                    return Err(Error::tool_invocation(format!(
                        "{} failed: {}",
                        method, message
                    )));
                }
                return Ok(frame.get("result").cloned().unwrap_or(Value::Null));
            }
        };

        tokio::time::timeout(request_timeout, wait)
            .await
            .map_err(|_| {
                Error::tool_invocation(format!(
                    "{} timed out after {:?}",
                    method, request_timeout
                ))
            })?
    }
}

#[async_trait]
impl ToolHost for StdioToolHost {
    async fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        self.connection = Some(self.spawn()?);

        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": "steward", "version": env!("CARGO_PKG_VERSION")}
        });
        let init = self
            .request("initialize", params)
            .await
            .map_err(|e| Error::connection(format!("initialize handshake failed: {}", e)));
        match init {
            Ok(_) => {}
            Err(e) => {
                self.close().await;
                return Err(e);
            }
        }
        self.write_frame(&notification_frame("notifications/initialized", json!({})))
            .await?;

        tracing::info!(command = %self.spec.command, "tool host connected");
        Ok(())
    }

    async fn list_tools(&mut self) -> Result<Vec<Tool>> {
        let result = self.request("tools/list", json!({})).await?;
        let entries = result
            .get("tools")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::tool_invocation("tools/list returned no tools array"))?;

        let mut tools = Vec::with_capacity(entries.len());
        for entry in entries {
            match Tool::from_listing(entry) {
                Some(tool) => tools.push(tool),
                None => tracing::warn!("skipping tool listing entry without a name"),
            }
        }
        Ok(tools)
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        let params = json!({"name": name, "arguments": arguments});
        let result = self.request("tools/call", params).await?;
        interpret_call_result(result)
    }

    async fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            // Closing stdin signals a clean shutdown to well-behaved hosts.
            let _ = connection.stdin.shutdown().await;
            if let Err(e) = connection.child.kill().await {
                tracing::debug!(error = %e, "tool host already exited");
            }
        }
    }
}

fn request_frame(id: u64, method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
}

fn notification_frame(method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "method": method, "params": params})
}

/// Map a `tools/call` result to the value grounding runs over.
///
/// Precedence: declared error, then `structuredContent`, then the joined text
/// content, then the raw result.
fn interpret_call_result(result: Value) -> Result<Value> {
    if result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        let message = first_text(&result).unwrap_or_else(|| "tool returned an error".to_string());
        return Err(Error::tool_invocation(message));
    }

    if let Some(structured) = result.get("structuredContent") {
        return Ok(structured.clone());
    }

    let text: Vec<String> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(Value::String(text.join("\n")));
    }
    Ok(result)
}

fn first_text(result: &Value) -> Option<String> {
    result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .map(String::from)
}

// =============================================================================
// Tests
// =============================================================================
