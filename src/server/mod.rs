//! HTTP front-end — health and chat endpoints over one shared agent.
//!
//! The agent is a single stateful session (one tool host connection), so
//! concurrent requests are serialized behind a tokio mutex rather than
//! interleaved on the transport.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::agent::Agent;
use crate::types::{Error, Result};

/// Shared server state: one agent per server process.
#[derive(Clone, Debug)]
pub struct AppState {
    agent: Arc<Mutex<Agent>>,
}

/// Build the router: `GET /health`, `POST /chat`.
pub fn router(agent: Arc<Mutex<Agent>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .with_state(AppState { agent })
}

/// Bind and serve until ctrl-c.
pub async fn serve(agent: Arc<Mutex<Agent>>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::connection(format!("cannot bind {}: {}", addr, e)))?;
    tracing::info!(addr, "HTTP server listening");

    axum::serve(listener, router(agent))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for shutdown signal");
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

type ChatResult = std::result::Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)>;

/// Pull the message out of a request body; `None` means 400.
fn parse_chat_message(body: &str) -> Option<String> {
    serde_json::from_str::<ChatRequest>(body)
        .ok()
        .and_then(|request| request.message)
        .filter(|m| !m.trim().is_empty())
}

async fn chat(State(state): State<AppState>, body: String) -> ChatResult {
    let message = parse_chat_message(&body).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing message".to_string(),
            }),
        )
    })?;

    let mut agent = state.agent.lock().await;
    match agent.send_message(&message).await {
        Ok(answer) => Ok(Json(ChatResponse { answer })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockToolHost;
    use crate::provider::PatternProvider;
    use crate::tools::Tool;
    use serde_json::json;

    async fn ready_state() -> AppState {
        let mut host = MockToolHost::new();
        host.expect_connect().returning(|| Ok(()));
        host.expect_list_tools().returning(|| {
            Ok(vec![Tool::from_listing(&json!({"name": "echo"})).unwrap()])
        });
        host.expect_call_tool()
            .returning(|_, _| Ok(json!("echoed")));
        host.expect_close().returning(|| ());

        let mut agent = Agent::new(
            Box::new(host),
            Box::new(PatternProvider::new(None)),
            None,
        );
        agent.initialize().await.unwrap();
        AppState {
            agent: Arc::new(Mutex::new(agent)),
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }

    #[test]
    fn parse_chat_message_rules() {
        assert_eq!(
            parse_chat_message(r#"{"message": "hi"}"#).as_deref(),
            Some("hi")
        );
        // Missing field, blank field, malformed body: all rejected.
        assert!(parse_chat_message("{}").is_none());
        assert!(parse_chat_message(r#"{"message": "   "}"#).is_none());
        assert!(parse_chat_message("not json").is_none());
        assert!(parse_chat_message("").is_none());
    }

    #[tokio::test]
    async fn chat_without_message_is_bad_request() {
        let state = ready_state().await;
        let (status, Json(body)) = chat(State(state), "{}".to_string()).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "missing message");
    }

    #[tokio::test]
    async fn chat_round_trip() {
        let state = ready_state().await;
        let body = r#"{"message": "use echo please"}"#.to_string();
        let Json(body) = chat(State(state), body).await.unwrap();
        assert_eq!(body.answer, "echoed");
    }

    #[tokio::test]
    async fn chat_pipeline_failure_is_internal_error() {
        let state = ready_state().await;
        // Names no tool and no default is configured.
        let body = r#"{"message": "hello there"}"#.to_string();
        let (status, Json(body)) = chat(State(state), body).await.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error.contains("failed to get response from tool host"));
    }
}
