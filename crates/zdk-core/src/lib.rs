//! Core traits and types for ZDK database tools
//!
//! This crate provides the foundational abstractions shared by every tool:
//! the `Tool` trait, the per-call `ToolContext`, the error type, and the
//! workspace configuration.

pub mod config;
pub mod error;
pub mod traits;

// Re-exports
pub use config::{LogFormat, MySqlSection, ObservabilityConfig, ZConfig};
pub use error::{Error, Result};
pub use traits::{Tool, ToolContext, ToolResponse};
