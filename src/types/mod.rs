//! Core types for the steward agent.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed session identifier
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for hosts, provider, and limits

mod config;
mod errors;
mod ids;

pub use config::{
    BackendKind, Config, LimitsConfig, ObservabilityConfig, ProviderConfig, ServerConfig,
    ToolHostSpec,
};
pub use errors::{Error, Result};
pub use ids::SessionId;
