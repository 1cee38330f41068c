//! Agent pipeline integration tests — validates the full
//! select→validate→invoke→ground exchange over an in-process tool host.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use steward::agent::{Agent, SessionState};
use steward::host::ToolHost;
use steward::provider::{CompletionProvider, PatternProvider, ToolSelection};
use steward::tools::{Tool, ToolCatalog};
use steward::types::{Error, Result};

/// In-process tool host with a scripted catalog and call results.
#[derive(Clone)]
struct FakeHost {
    listing: Vec<Value>,
    call_result: Arc<dyn Fn(&str, &Value) -> Result<Value> + Send + Sync>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    closes: Arc<Mutex<usize>>,
}

impl FakeHost {
    fn new(listing: Vec<Value>) -> Self {
        Self {
            listing,
            call_result: Arc::new(|_, _| Ok(json!("ok"))),
            calls: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(Mutex::new(0)),
        }
    }

    fn with_call_result(
        mut self,
        f: impl Fn(&str, &Value) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.call_result = Arc::new(f);
        self
    }

    fn recorded_calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn close_count(&self) -> usize {
        *self.closes.lock().unwrap()
    }
}

#[async_trait]
impl ToolHost for FakeHost {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn list_tools(&mut self) -> Result<Vec<Tool>> {
        Ok(self
            .listing
            .iter()
            .filter_map(Tool::from_listing)
            .collect())
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        (self.call_result)(name, &arguments)
    }

    async fn close(&mut self) {
        *self.closes.lock().unwrap() += 1;
    }
}

/// Provider returning one fixed selection, for driving dispatcher edges.
#[derive(Debug)]
struct ScriptedProvider {
    selection: ToolSelection,
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn is_initialized(&self) -> bool {
        true
    }
    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }
    async fn analyze_intent(&self, _message: &str, _catalog: &ToolCatalog) -> Result<ToolSelection> {
        Ok(self.selection.clone())
    }
    async fn generate_grounded_response(&self, _: &str, _: &str, result: &Value) -> String {
        result.to_string()
    }
    async fn close(&mut self) {}
}

fn weather_listing() -> Vec<Value> {
    vec![json!({
        "name": "get_weather",
        "description": "Current weather for a city",
        "inputSchema": {
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"]
        }
    })]
}

fn pattern_agent(host: FakeHost, default_tool: Option<&str>) -> Agent {
    Agent::new(
        Box::new(host),
        Box::new(PatternProvider::new(default_tool.map(String::from))),
        default_tool.map(String::from),
    )
}

#[tokio::test]
async fn validation_mismatch_falls_back_to_message_arguments() {
    // The schema requires `city`, the schema-free selection only carries the
    // raw message, so the host must receive the message-only fallback.
    let host = FakeHost::new(weather_listing())
        .with_call_result(|_, _| Ok(json!({"temp_c": 21, "sky": "clear"})));
    let mut agent = pattern_agent(host.clone(), None);

    agent.initialize().await.unwrap();
    let answer = agent
        .send_message("use get_weather for Lisbon")
        .await
        .unwrap();

    let calls = host.recorded_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "get_weather");
    assert_eq!(calls[0].1, json!({"message": "use get_weather for Lisbon"}));

    // Schema-free grounding returns the raw serialized result.
    assert!(answer.contains("\"temp_c\": 21"));
}

#[tokio::test]
async fn conforming_arguments_reach_the_host_unchanged() {
    let host = FakeHost::new(weather_listing());
    let provider = ScriptedProvider {
        selection: ToolSelection {
            tool_name: "get_weather".to_string(),
            reason: None,
            parameters: json!({"city": "Lisbon", "units": "metric"})
                .as_object()
                .cloned()
                .unwrap(),
        },
    };
    let mut agent = Agent::new(Box::new(host.clone()), Box::new(provider), None);

    agent.initialize().await.unwrap();
    agent.send_message("weather in Lisbon?").await.unwrap();

    // Round-trip identity, undeclared `units` included.
    let calls = host.recorded_calls();
    assert_eq!(calls[0].1, json!({"city": "Lisbon", "units": "metric"}));
}

#[tokio::test]
async fn default_tool_fallback_end_to_end() {
    let host = FakeHost::new(weather_listing());
    let mut agent = pattern_agent(host.clone(), Some("get_weather"));

    agent.initialize().await.unwrap();
    agent.send_message("how warm is it in Lisbon?").await.unwrap();

    let calls = host.recorded_calls();
    assert_eq!(calls[0].0, "get_weather");
    assert_eq!(calls[0].1, json!({"message": "how warm is it in Lisbon?"}));
}

#[tokio::test]
async fn selection_failure_without_default_is_reported_and_survivable() {
    let host = FakeHost::new(weather_listing());
    let mut agent = pattern_agent(host.clone(), None);

    agent.initialize().await.unwrap();
    let err = agent.send_message("how warm is it?").await.unwrap_err();
    assert!(err.to_string().contains("failed to get response from tool host"));
    assert!(host.recorded_calls().is_empty());

    // Same session still completes a well-formed exchange.
    agent.send_message("use get_weather for Porto").await.unwrap();
    assert_eq!(host.recorded_calls().len(), 1);
}

#[tokio::test]
async fn unknown_selection_never_reaches_the_host() {
    let host = FakeHost::new(weather_listing());
    let provider = ScriptedProvider {
        selection: ToolSelection {
            tool_name: "not_in_catalog".to_string(),
            reason: None,
            parameters: Default::default(),
        },
    };
    let mut agent = Agent::new(Box::new(host.clone()), Box::new(provider), None);

    agent.initialize().await.unwrap();
    let err = agent.send_message("anything").await.unwrap_err();
    assert!(err.to_string().contains("unknown tool"));
    assert!(host.recorded_calls().is_empty());
    assert_eq!(agent.state(), SessionState::Ready);
}

#[tokio::test]
async fn host_rejection_wraps_and_skips_grounding() {
    let host = FakeHost::new(weather_listing())
        .with_call_result(|_, _| Err(Error::tool_invocation("backend exploded")));
    let mut agent = pattern_agent(host.clone(), None);

    agent.initialize().await.unwrap();
    let err = agent
        .send_message("use get_weather for Lisbon")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed to get response from tool host"));
    assert!(err.to_string().contains("backend exploded"));
    assert_eq!(agent.state(), SessionState::Ready);
}

#[tokio::test]
async fn state_guards_apply_before_and_after_lifecycle() {
    let host = FakeHost::new(weather_listing());
    let mut agent = pattern_agent(host.clone(), None);

    // Before initialize: fail fast, no I/O.
    let err = agent.send_message("use get_weather").await.unwrap_err();
    assert_eq!(err.to_string(), "agent not initialized");
    assert!(host.recorded_calls().is_empty());

    agent.initialize().await.unwrap();
    agent.close().await;
    assert_eq!(agent.state(), SessionState::Closed);

    // After close: same error class.
    let err = agent.send_message("use get_weather").await.unwrap_err();
    assert_eq!(err.to_string(), "agent not initialized");
}

#[tokio::test]
async fn close_is_idempotent() {
    let host = FakeHost::new(weather_listing());
    let mut agent = pattern_agent(host.clone(), None);

    agent.initialize().await.unwrap();
    agent.close().await;
    agent.close().await;
    assert_eq!(host.close_count(), 1);
}

#[tokio::test]
async fn close_without_initialize_is_safe() {
    let host = FakeHost::new(weather_listing());
    let mut agent = pattern_agent(host.clone(), None);
    agent.close().await;
    agent.close().await;
    // Transport released at most once even though it never connected.
    assert_eq!(host.close_count(), 1);
}
