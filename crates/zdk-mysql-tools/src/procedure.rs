//! `mysql_execute_procedure`: call a stored procedure and collect its result sets

use crate::config::{ConnectionConfig, ConnectionOverrides, ToolSettings};
use crate::connection::{Connector, ScopedSession};
use crate::envelope::ResultEnvelope;
use crate::error::DatabaseToolError;
use crate::row::Row;
use crate::tools::{
    CallRecord, MYSQL_PROCEDURE_TOOL, connection_properties, finish_call, parse_params, reject,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use zdk_core::Result as ZResult;
use zdk_tool::{FunctionTool, ToolSchema};

/// Arguments of `mysql_execute_procedure`
#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureArgs {
    pub connection: ConnectionOverrides,
    pub procedure: String,
    #[serde(default)]
    pub parameters: Option<ProcedureParameters>,
}

/// Procedure arguments as the caller sent them
///
/// An array gives the positional order explicitly. An object is read in the
/// order its keys appear in the request; the names themselves are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProcedureParameters {
    Ordered(Vec<Value>),
    Named(Map<String, Value>),
}

impl ProcedureParameters {
    pub fn into_positional(self) -> Vec<Value> {
        match self {
            Self::Ordered(values) => values,
            Self::Named(map) => {
                if map.len() > 1 {
                    let order: Vec<&str> = map.keys().map(String::as_str).collect();
                    tracing::warn!(
                        order = ?order,
                        "Named procedure parameters passed positionally in request order"
                    );
                }
                map.into_iter().map(|(_, value)| value).collect()
            }
        }
    }
}

/// Call `procedure` and return its row-bearing result sets in order
///
/// The name and arguments are validated before any connection is opened.
/// Argument values never become SQL text: the `CALL` is prepared and each
/// value is bound to its placeholder.
pub async fn execute_procedure(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    procedure: &str,
    parameters: Option<ProcedureParameters>,
    timeout: Duration,
) -> ResultEnvelope {
    let args = parameters
        .map(ProcedureParameters::into_positional)
        .unwrap_or_default();

    let statement = match build_call_statement(procedure, &args) {
        Ok(statement) => statement,
        Err(e) => return e.into(),
    };

    ResultEnvelope::from_result(run_call(connector, config, &statement, &args, timeout).await)
}

async fn run_call(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    statement: &str,
    args: &[Value],
    timeout: Duration,
) -> Result<Vec<Vec<Row>>, DatabaseToolError> {
    let mut session = ScopedSession::open(connector, config, timeout).await?;
    let sets = session.fetch_result_sets(statement, args).await;
    session.release().await;
    sets
}

/// Render `CALL <name>(?, ...)` with one placeholder per argument
pub fn build_call_statement(procedure: &str, args: &[Value]) -> Result<String, DatabaseToolError> {
    let name = quote_procedure_name(procedure)?;

    if args.iter().any(|v| v.is_array() || v.is_object()) {
        return Err(DatabaseToolError::InvalidParameters(
            "Procedure parameters must be strings, numbers, booleans or null".to_string(),
        ));
    }

    let placeholders = vec!["?"; args.len()].join(", ");
    Ok(format!("CALL {}({})", name, placeholders))
}

/// Backtick-quote a procedure name, optionally qualified by its schema
pub fn quote_procedure_name(name: &str) -> Result<String, DatabaseToolError> {
    let parts: Vec<&str> = name.trim().split('.').collect();

    let valid = parts.len() <= 2
        && parts.iter().all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        });

    if !valid {
        return Err(DatabaseToolError::InvalidParameters(format!(
            "Invalid procedure name: '{}'",
            name
        )));
    }

    Ok(parts
        .iter()
        .map(|part| format!("`{}`", part))
        .collect::<Vec<_>>()
        .join("."))
}

pub(crate) fn create_procedure_tool(
    connector: Arc<dyn Connector>,
    settings: ToolSettings,
) -> ZResult<FunctionTool> {
    let connection = connection_properties(ToolSchema::new(), Some(&settings.defaults));

    let schema = ToolSchema::new()
        .object_property("connection", "MySQL connection parameters", connection)
        .property("procedure", "string", "Name of the stored procedure")
        .raw_property(
            "parameters",
            json!({
                "type": ["array", "object"],
                "description": "Procedure arguments, as an ordered array or an object read in key order",
                "items": {"type": ["string", "number", "boolean", "null"]},
                "additionalProperties": {"type": ["string", "number", "boolean", "null"]}
            }),
        )
        .required("connection")
        .required("procedure")
        .build();

    FunctionTool::builder()
        .name(MYSQL_PROCEDURE_TOOL)
        .description("Execute stored procedure in MySQL database")
        .schema(schema)
        .execute(move |ctx, params| {
            let connector = connector.clone();
            let settings = settings.clone();
            async move {
                let args: ProcedureArgs = match parse_params(params) {
                    Ok(args) => args,
                    Err(e) => return reject(&ctx, MYSQL_PROCEDURE_TOOL, e),
                };
                let config = args.connection.resolve(&settings.defaults);

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    procedure = %args.procedure,
                    database = %config.database,
                    "Calling MySQL stored procedure"
                );

                let envelope = execute_procedure(
                    connector.as_ref(),
                    &config,
                    &args.procedure,
                    args.parameters.clone(),
                    settings.timeout,
                )
                .await;

                finish_call(
                    &ctx,
                    CallRecord {
                        tool: MYSQL_PROCEDURE_TOOL,
                        operation: "call",
                        statement: &args.procedure,
                        config: &config,
                    },
                    envelope,
                )
            }
        })
        .build()
}
