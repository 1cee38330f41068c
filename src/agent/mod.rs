//! Agent facade and tool dispatcher.
//!
//! The `Agent` owns all session state — one tool host handle, one catalog
//! snapshot, one completion provider — and drives the five-step exchange:
//! analyze intent → catalog lookup → validate arguments → invoke tool →
//! ground the response. Sessions move `Uninitialized → Ready → Closed`
//! (terminal) and a failed exchange never corrupts session state.

use serde_json::Value;

use crate::host::ToolHost;
use crate::provider::{CompletionProvider, PatternProvider};
use crate::tools::{fallback_arguments, ToolCatalog};
use crate::types::{Error, Result, SessionId};

/// Session lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Closed,
}

/// The externally consumed unit: `initialize`, `send_message`, `close`.
pub struct Agent {
    session_id: SessionId,
    host: Box<dyn ToolHost>,
    provider: Box<dyn CompletionProvider>,
    /// Schema-free stand-in used when the configured provider fails to
    /// initialize for a non-fatal reason.
    fallback: PatternProvider,
    degraded: bool,
    catalog: ToolCatalog,
    state: SessionState,
}

impl Agent {
    /// Assemble an agent. Nothing connects until [`Agent::initialize`].
    ///
    /// `default_tool` feeds the degraded-mode variant so the fallback policy
    /// stays consistent with the configured provider's.
    pub fn new(
        host: Box<dyn ToolHost>,
        provider: Box<dyn CompletionProvider>,
        default_tool: Option<String>,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            host,
            provider,
            fallback: PatternProvider::new(default_tool),
            degraded: false,
            catalog: ToolCatalog::new(),
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Whether the session runs on the schema-free variant after a failed
    /// provider initialization.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn active_provider(&self) -> &dyn CompletionProvider {
        if self.degraded {
            &self.fallback
        } else {
            self.provider.as_ref()
        }
    }

    /// Connect the tool host, snapshot the catalog, initialize the provider.
    ///
    /// Transport failures (and a missing provider credential) leave the
    /// session `Uninitialized`; any other provider failure degrades to the
    /// schema-free variant and the session still becomes `Ready`.
    pub async fn initialize(&mut self) -> Result<()> {
        match self.state {
            SessionState::Ready => return Ok(()),
            SessionState::Closed => {
                return Err(Error::connection("agent session is closed"));
            }
            SessionState::Uninitialized => {}
        }

        self.host.connect().await?;

        let tools = match self.host.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                self.host.close().await;
                return Err(Error::connection(format!("cannot fetch tool catalog: {}", e)));
            }
        };
        self.catalog = ToolCatalog::from_tools(tools);

        let provider_ready = match self.provider.initialize().await {
            // Trust the provider's own report, not just the Ok.
            Ok(()) => self.provider.is_initialized(),
            Err(e @ Error::Configuration(_)) => {
                // A missing credential is an operator problem; do not limp on.
                self.host.close().await;
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "provider initialization failed");
                false
            }
        };
        if !provider_ready {
            tracing::warn!(
                session = %self.session_id,
                "provider unavailable; continuing with the schema-free variant"
            );
            self.fallback.initialize().await?;
            self.degraded = true;
        }

        self.state = SessionState::Ready;
        tracing::info!(
            session = %self.session_id,
            tools = self.catalog.len(),
            degraded = self.degraded,
            "agent ready"
        );
        Ok(())
    }

    /// Run one exchange. Only valid in `Ready`; a failed exchange is reported
    /// as a single wrapped error and the session stays `Ready`.
    pub async fn send_message(&mut self, message: &str) -> Result<String> {
        if self.state != SessionState::Ready {
            return Err(Error::NotInitialized);
        }

        match self.dispatch(message).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "exchange failed");
                Err(Error::tool_invocation(format!(
                    "failed to get response from tool host: {}",
                    e
                )))
            }
        }
    }

    async fn dispatch(&mut self, message: &str) -> Result<String> {
        // (1) Which tool, with what arguments.
        let selection = self
            .active_provider()
            .analyze_intent(message, &self.catalog)
            .await?;

        // (2) The selection must reference the live catalog; never hand the
        // host a name it did not publish.
        let tool = self
            .catalog
            .get(&selection.tool_name)
            .ok_or_else(|| {
                Error::tool_selection(format!("selected unknown tool '{}'", selection.tool_name))
            })?;
        let tool_name = tool.name.clone();
        tracing::info!(
            session = %self.session_id,
            tool = %tool_name,
            reason = selection.reason.as_deref().unwrap_or(""),
            "tool selected"
        );

        // (3) Validate extracted arguments; a mismatch degrades to the
        // message-only fallback instead of failing the exchange.
        let arguments = match &tool.input_schema {
            Some(schema) => match schema.check(&selection.parameters) {
                Ok(()) => selection.parameters,
                Err(violations) => {
                    tracing::warn!(
                        session = %self.session_id,
                        tool = %tool_name,
                        violations = violations.join("; "),
                        "arguments failed validation; using message-only fallback"
                    );
                    fallback_arguments(message)
                }
            },
            None => selection.parameters,
        };

        // (4) Invoke.
        let result = self
            .host
            .call_tool(&tool_name, Value::Object(arguments))
            .await?;

        // (5) Ground the answer in the raw result.
        let answer = self
            .active_provider()
            .generate_grounded_response(message, &tool_name, &result)
            .await;
        Ok(answer)
    }

    /// Tear down transport and provider. Idempotent; safe when never
    /// connected.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.host.close().await;
        self.provider.close().await;
        self.fallback.close().await;
        self.state = SessionState::Closed;
        tracing::info!(session = %self.session_id, "agent closed");
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("tools", &self.catalog.len())
            .field("degraded", &self.degraded)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
