//! Tool infrastructure — catalog, declarative schemas, argument validation.
//!
//! The agent owns tool *metadata* (not implementations — the tool host keeps
//! the executables). The catalog is a snapshot fetched once at initialization;
//! schemas drive prompt signatures and argument validation.

pub mod catalog;
pub mod schema;

pub use catalog::{Tool, ToolCatalog};
pub use schema::{fallback_arguments, Schema, SchemaNode};
