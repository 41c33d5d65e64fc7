use super::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Tool trait - abstraction for callable tools
///
/// A tool describes itself (`name`, `description`, `schema`) so a caller can
/// build arguments, and performs one unit of work per `execute` call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the stable identifier of the tool
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's parameters
    fn schema(&self) -> serde_json::Value;

    /// Indicates whether this is a long-running tool
    fn is_long_running(&self) -> bool {
        false
    }

    /// Executes the tool with given parameters
    async fn execute(
        &self,
        ctx: Arc<dyn ToolContext>,
        params: serde_json::Value,
    ) -> Result<ToolResponse>;
}

/// Per-call identifiers handed to a tool
pub trait ToolContext: Send + Sync {
    /// Id of the function call that triggered this execution
    fn function_call_id(&self) -> &str;

    /// Id of the surrounding invocation, used to correlate logs
    fn invocation_id(&self) -> &str;
}

/// Tool execution response
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub result: serde_json::Value,
}

impl ToolResponse {
    /// Wrap any serializable value as a tool response
    pub fn from_serialize<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self {
            result: serde_json::to_value(value)?,
        })
    }
}
