//! # Steward - Tool-Grounded Chat Agent
//!
//! Rust implementation of the steward agent providing:
//! - LLM-driven tool selection over a live MCP tool catalog
//! - Schema validation of extracted tool arguments with graceful fallback
//! - Stdio JSON-RPC tool host transport (spawned subprocess)
//! - Response grounding: final answers constrained to tool results
//! - Terminal REPL and HTTP front-ends sharing one agent
//!
//! ## Architecture
//!
//! The agent follows a single-owner model where the `Agent` owns all session
//! state (host handle, catalog snapshot, provider instance):
//! ```text
//!   message → ┌─────────────────────────────────┐
//!             │          Agent Facade           │
//!             │  ┌─────────┐  ┌──────────────┐  │
//!             │  │Provider │→ │Schema        │  │
//!             │  │ (intent)│  │ Validator    │  │
//!             │  └─────────┘  └──────────────┘  │
//!             │        ↓             ↓          │
//!             │  ┌─────────┐  ┌──────────────┐  │
//!             │  │Tool Host│→ │Provider      │  │
//!             │  │ (stdio) │  │ (grounding)  │  │
//!             │  └─────────┘  └──────────────┘  │
//!             └─────────────────────────────────┘ → answer
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

// Re-export public API
pub mod agent;
pub mod host;
pub mod prompts;
pub mod provider;
pub mod repl;
pub mod server;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use types::{Config, Error, Result};
