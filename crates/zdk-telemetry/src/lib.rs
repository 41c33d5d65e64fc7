//! # ZDK Telemetry
//!
//! OpenTelemetry integration for tracing database tool calls.
//!
//! `init_telemetry` installs the process-wide subscriber (structured logs plus
//! an OpenTelemetry layer); `trace_db_call` records one span per tool
//! invocation using the OpenTelemetry database semantic conventions.

mod spans;
mod tracer;

pub use spans::{DbSpanAttributes, trace_db_call};
pub use tracer::{
    TelemetryOptions, init_telemetry, register_span_processor, tracer_provider,
};

/// OpenTelemetry span attribute names used by the database tools.
pub mod attributes {
    // Database semantic conventions
    pub const DB_SYSTEM: &str = "db.system";
    pub const DB_NAME: &str = "db.name";
    pub const DB_OPERATION: &str = "db.operation";
    pub const DB_STATEMENT: &str = "db.statement";
    pub const SERVER_ADDRESS: &str = "server.address";
    pub const SERVER_PORT: &str = "server.port";

    // Tool-call attributes
    pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";
    pub const GEN_AI_TOOL_NAME: &str = "gen_ai.tool.name";
    pub const GEN_AI_TOOL_CALL_ID: &str = "gen_ai.tool.call.id";
    pub const ZDK_INVOCATION_ID: &str = "zdk.invocation_id";
    pub const ZDK_ENVELOPE_STATUS: &str = "zdk.envelope.status";

    pub const DB_SYSTEM_MYSQL: &str = "mysql";

    /// Default tracer name when no service name is configured
    pub const SYSTEM_NAME: &str = "zdk.mysql-tools";
}
