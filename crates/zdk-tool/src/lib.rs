//! Tool system for ZDK
//!
//! This crate provides the tool execution framework, including:
//! - Function tools backed by async closures
//! - A JSON schema builder for tool parameters
//! - A default tool context for direct invocation and tests

pub mod context;
pub mod function_tool;
pub mod schema;

// Re-exports
pub use context::DefaultToolContext;
pub use function_tool::{FunctionTool, FunctionToolBuilder};
pub use schema::ToolSchema;

// Re-export core types
pub use zdk_core::{Result, Tool, ToolContext, ToolResponse};
