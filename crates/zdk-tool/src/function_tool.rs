use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::Instrument;
use zdk_core::{Error, Result, Tool, ToolContext, ToolResponse};

/// Type alias for tool execution function
pub type ToolFn = Box<
    dyn Fn(
            Arc<dyn ToolContext>,
            Value,
        ) -> Pin<Box<dyn Future<Output = Result<ToolResponse>> + Send>>
        + Send
        + Sync,
>;

/// A tool whose behaviour is an async closure
///
/// Every execution runs inside an `execute_tool` span carrying the tool
/// name and the call identifiers from the context.
pub struct FunctionTool {
    name: String,
    description: String,
    schema: Value,
    is_long_running: bool,
    execute_fn: ToolFn,
}

impl FunctionTool {
    pub fn builder() -> FunctionToolBuilder {
        FunctionToolBuilder::new()
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .field("is_long_running", &self.is_long_running)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        self.schema.clone()
    }

    fn is_long_running(&self) -> bool {
        self.is_long_running
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, params: Value) -> Result<ToolResponse> {
        let span = tracing::debug_span!(
            "execute_tool",
            tool = %self.name,
            invocation_id = %ctx.invocation_id(),
            function_call_id = %ctx.function_call_id(),
        );
        (self.execute_fn)(ctx, params).instrument(span).await
    }
}

/// Builder for FunctionTool
#[derive(Default)]
pub struct FunctionToolBuilder {
    name: Option<String>,
    description: Option<String>,
    schema: Option<Value>,
    is_long_running: bool,
    execute_fn: Option<ToolFn>,
}

impl FunctionToolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn long_running(mut self, is_long_running: bool) -> Self {
        self.is_long_running = is_long_running;
        self
    }

    pub fn execute<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<dyn ToolContext>, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResponse>> + Send + 'static,
    {
        self.execute_fn = Some(Box::new(move |ctx, params| Box::pin(f(ctx, params))));
        self
    }

    /// Build the tool
    ///
    /// Tool names are identifiers handed to a model, so they are restricted
    /// to ASCII letters, digits, `_` and `-`.
    pub fn build(self) -> Result<FunctionTool> {
        let name = self
            .name
            .ok_or_else(|| Error::config_error("Tool name is required"))?;

        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::config_error(format!("Invalid tool name: '{}'", name)));
        }

        Ok(FunctionTool {
            name,
            description: self
                .description
                .ok_or_else(|| Error::config_error("Tool description is required"))?,
            schema: self.schema.unwrap_or(Value::Null),
            is_long_running: self.is_long_running,
            execute_fn: self
                .execute_fn
                .ok_or_else(|| Error::config_error("Tool execute function is required"))?,
        })
    }
}
