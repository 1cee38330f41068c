//! Backend-backed completion provider.
//!
//! One adapter parameterized by backend family (Anthropic messages API,
//! OpenAI-compatible chat completions). Credentials resolve exactly once at
//! `initialize` — explicit config value first, then the backend's environment
//! variable. Prompt templates and JSON extraction are shared with every other
//! variant; only the wire format differs per backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::prompts;
use crate::provider::{
    extract, render_raw_result, unresolved_selection, CompletionProvider, ToolSelection,
};
use crate::tools::ToolCatalog;
use crate::types::{BackendKind, Error, LimitsConfig, ProviderConfig, Result};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Completion provider speaking to a hosted model over HTTP.
pub struct LlmProvider {
    backend: BackendKind,
    model: String,
    base_url: String,
    configured_key: Option<String>,
    default_tool: Option<String>,
    max_output_tokens: u32,
    timeout: Duration,
    client: Option<BackendClient>,
}

/// Live HTTP handle; present only between `initialize` and `close`.
struct BackendClient {
    http: reqwest::Client,
    api_key: String,
}

impl LlmProvider {
    pub fn new(provider: &ProviderConfig, limits: &LimitsConfig) -> Self {
        let backend = provider.backend;
        let model = provider
            .model
            .clone()
            .unwrap_or_else(|| default_model(backend).to_string());
        let base_url = provider
            .base_url
            .as_deref()
            .unwrap_or_else(|| default_base_url(backend))
            .trim_end_matches('/')
            .to_string();

        Self {
            backend,
            model,
            base_url,
            configured_key: provider.api_key.clone(),
            default_tool: provider.default_tool.clone(),
            max_output_tokens: limits.max_output_tokens,
            timeout: limits.provider_timeout,
            client: None,
        }
    }

    /// Resolve the credential: explicit config value, else environment.
    fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.configured_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        let var = credential_env(self.backend);
        match std::env::var(var) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::configuration(format!(
                "no API key for {:?}: set provider.api_key or {}",
                self.backend, var
            ))),
        }
    }

    /// Single-turn completion: system instruction + user content → text.
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::configuration("provider not initialized"))?;

        match self.backend {
            BackendKind::Anthropic => {
                let url = format!("{}/v1/messages", self.base_url);
                let body = AnthropicRequest {
                    model: &self.model,
                    max_tokens: self.max_output_tokens,
                    system,
                    messages: vec![WireMessage {
                        role: "user",
                        content: user,
                    }],
                };
                let raw = send(client, &url, &body, |req| {
                    req.header("x-api-key", &client.api_key)
                        .header("anthropic-version", ANTHROPIC_VERSION)
                })
                .await?;
                parse_anthropic_response(&raw)
            }
            BackendKind::OpenAi => {
                let url = format!("{}/chat/completions", self.base_url);
                let body = OpenAiRequest {
                    model: &self.model,
                    max_tokens: self.max_output_tokens,
                    messages: vec![
                        WireMessage {
                            role: "system",
                            content: system,
                        },
                        WireMessage {
                            role: "user",
                            content: user,
                        },
                    ],
                };
                let raw = send(client, &url, &body, |req| req.bearer_auth(&client.api_key)).await?;
                parse_openai_response(&raw)
            }
            BackendKind::Pattern => Err(Error::configuration(
                "pattern backend does not use an LLM client",
            )),
        }
    }

    /// Turn a selection reply into a validated [`ToolSelection`].
    fn resolve_selection(
        &self,
        reply: &str,
        catalog: &ToolCatalog,
        message: &str,
    ) -> Result<ToolSelection> {
        let default_tool = self.default_tool.as_deref();

        let Some(value) = extract::first_json_object(reply) else {
            return unresolved_selection(default_tool, catalog, message, "reply contained no JSON object");
        };

        let selection: ToolSelection = match serde_json::from_value(value) {
            Ok(selection) => selection,
            Err(e) => {
                return unresolved_selection(
                    default_tool,
                    catalog,
                    message,
                    &format!("selection reply malformed: {}", e),
                );
            }
        };

        if !catalog.has_tool(&selection.tool_name) {
            return unresolved_selection(
                default_tool,
                catalog,
                message,
                &format!("selected unknown tool '{}'", selection.tool_name),
            );
        }

        Ok(selection)
    }
}

#[async_trait]
impl CompletionProvider for LlmProvider {
    fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    async fn initialize(&mut self) -> Result<()> {
        let api_key = self.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::configuration(format!("cannot build HTTP client: {}", e)))?;
        self.client = Some(BackendClient { http, api_key });
        tracing::info!(backend = ?self.backend, model = %self.model, "provider initialized");
        Ok(())
    }

    async fn analyze_intent(&self, message: &str, catalog: &ToolCatalog)
        -> Result<ToolSelection> {
        let prompt = prompts::tool_selection_prompt(message, &catalog.tools());
        match self.complete(prompts::TOOL_SELECTION_SYSTEM, &prompt).await {
            Ok(reply) => self.resolve_selection(&reply, catalog, message),
            Err(e) => unresolved_selection(
                self.default_tool.as_deref(),
                catalog,
                message,
                &format!("intent analysis failed: {}", e),
            ),
        }
    }

    async fn generate_grounded_response(
        &self,
        message: &str,
        tool_name: &str,
        tool_result: &Value,
    ) -> String {
        let prompt = prompts::grounded_response_prompt(message, tool_name, tool_result);
        match self.complete(prompts::GROUNDED_RESPONSE_SYSTEM, &prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "grounding failed; returning raw tool result");
                format!(
                    "The {} tool returned the following data:\n{}",
                    tool_name,
                    render_raw_result(tool_result)
                )
            }
        }
    }

    async fn close(&mut self) {
        self.client = None;
    }
}

impl std::fmt::Debug for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProvider")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("initialized", &self.client.is_some())
            .finish()
    }
}

fn default_model(backend: BackendKind) -> &'static str {
    match backend {
        BackendKind::Anthropic => "claude-sonnet-4-5",
        BackendKind::OpenAi => "gpt-4o-mini",
        BackendKind::Pattern => "",
    }
}

fn default_base_url(backend: BackendKind) -> &'static str {
    match backend {
        BackendKind::Anthropic => ANTHROPIC_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}

fn credential_env(backend: BackendKind) -> &'static str {
    match backend {
        BackendKind::Anthropic => "ANTHROPIC_API_KEY",
        _ => "OPENAI_API_KEY",
    }
}

/// POST a JSON body, returning the response text or a generation error.
async fn send<B: Serialize>(
    client: &BackendClient,
    url: &str,
    body: &B,
    decorate: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
) -> Result<String> {
    let request = decorate(client.http.post(url).json(body));
    let response = request
        .send()
        .await
        .map_err(|e| Error::generation(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::generation(format!("reading response from {} failed: {}", url, e)))?;

    if !status.is_success() {
        return Err(Error::generation(format!(
            "backend returned {}: {}",
            status, text
        )));
    }
    Ok(text)
}

// Wire shapes ----------------------------------------------------------------

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn parse_anthropic_response(raw: &str) -> Result<String> {
    let parsed: AnthropicResponse = serde_json::from_str(raw)
        .map_err(|e| Error::generation(format!("unexpected Anthropic response: {}", e)))?;
    let text: Vec<&str> = parsed
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text.as_str())
        .collect();
    Ok(text.join(""))
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessageOut,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessageOut {
    content: Option<String>,
}

fn parse_openai_response(raw: &str) -> Result<String> {
    let parsed: OpenAiResponse = serde_json::from_str(raw)
        .map_err(|e| Error::generation(format!("unexpected OpenAI response: {}", e)))?;
    Ok(parsed
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .unwrap_or_default())
}

// =============================================================================
// Tests
// =============================================================================
