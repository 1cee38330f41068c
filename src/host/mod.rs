//! Tool host transport — discovery and invocation of remote tools.
//!
//! The agent depends on the [`ToolHost`] seam instead of a concrete
//! transport; [`StdioToolHost`] is the production implementation speaking
//! newline-delimited JSON-RPC to a spawned subprocess.

pub mod stdio;

pub use stdio::StdioToolHost;

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Tool;
use crate::types::Result;

/// A process/endpoint that lists and executes named tools.
///
/// Calls take `&mut self`: the underlying connection is a single stateful
/// channel that does not tolerate interleaved requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolHost: Send {
    /// Establish the transport. Fails with a connection error when the host
    /// cannot be reached.
    async fn connect(&mut self) -> Result<()>;

    /// Discover the host's tools.
    async fn list_tools(&mut self) -> Result<Vec<Tool>>;

    /// Invoke a named tool with a JSON argument object.
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value>;

    /// Tear down the transport. Idempotent; safe when never connected.
    async fn close(&mut self);
}
