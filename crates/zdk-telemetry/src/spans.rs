//! Span helpers for database tool executions

use crate::attributes::*;

/// Longest statement text recorded on a span
const MAX_STATEMENT_CHARS: usize = 1024;

/// Attributes for tracing one database tool call
#[derive(Debug, Clone)]
pub struct DbSpanAttributes {
    pub tool_name: String,
    pub tool_call_id: String,
    pub invocation_id: String,
    /// Operation kind, e.g. `query`, `call`, `analysis`
    pub operation: String,
    pub statement: String,
    pub database: String,
    pub host: String,
    pub port: u16,
    /// `success` or `error`
    pub status: String,
}

/// Record an OpenTelemetry span for a finished database tool call.
///
/// Long statements are truncated so spans stay bounded.
pub fn trace_db_call(attrs: DbSpanAttributes) {
    let statement: String = attrs.statement.chars().take(MAX_STATEMENT_CHARS).collect();

    let span = tracing::info_span!(
        "db_tool_call",
        { GEN_AI_OPERATION_NAME } = "execute_tool",
        { GEN_AI_TOOL_NAME } = %attrs.tool_name,
        { GEN_AI_TOOL_CALL_ID } = %attrs.tool_call_id,
        { ZDK_INVOCATION_ID } = %attrs.invocation_id,
        { DB_SYSTEM } = DB_SYSTEM_MYSQL,
        { DB_NAME } = %attrs.database,
        { DB_OPERATION } = %attrs.operation,
        { DB_STATEMENT } = %statement,
        { SERVER_ADDRESS } = %attrs.host,
        { SERVER_PORT } = attrs.port,
        { ZDK_ENVELOPE_STATUS } = %attrs.status,
    );

    // Enter and immediately exit the span (it's recorded)
    let _guard = span.enter();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_span_attributes() {
        let attrs = DbSpanAttributes {
            tool_name: "mysql_query".to_string(),
            tool_call_id: "call-123".to_string(),
            invocation_id: "inv-123".to_string(),
            operation: "query".to_string(),
            statement: "SELECT 1".repeat(500),
            database: "openmanus".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            status: "success".to_string(),
        };

        // Recording without a subscriber must not panic
        trace_db_call(attrs);
    }
}
