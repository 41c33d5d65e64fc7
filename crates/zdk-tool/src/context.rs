use zdk_core::ToolContext;

/// Default implementation of ToolContext
///
/// Used when a tool is invoked directly rather than from an agent runtime,
/// and by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultToolContext {
    function_call_id: String,
    invocation_id: String,
}

impl DefaultToolContext {
    pub fn new(function_call_id: impl Into<String>, invocation_id: impl Into<String>) -> Self {
        Self {
            function_call_id: function_call_id.into(),
            invocation_id: invocation_id.into(),
        }
    }

    /// Context for a one-off call where the call id doubles as invocation id
    pub fn standalone(call_id: impl Into<String>) -> Self {
        let call_id = call_id.into();
        Self {
            invocation_id: call_id.clone(),
            function_call_id: call_id,
        }
    }
}

impl ToolContext for DefaultToolContext {
    fn function_call_id(&self) -> &str {
        &self.function_call_id
    }

    fn invocation_id(&self) -> &str {
        &self.invocation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_context_creation() {
        let ctx = DefaultToolContext::new("call-123", "inv-456");

        assert_eq!(ctx.function_call_id(), "call-123");
        assert_eq!(ctx.invocation_id(), "inv-456");
    }

    #[test]
    fn test_standalone_context() {
        let ctx = DefaultToolContext::standalone("cli-1");
        assert_eq!(ctx.function_call_id(), "cli-1");
        assert_eq!(ctx.invocation_id(), "cli-1");
    }
}
