//! Tool factory and the plumbing shared by the three MySQL tools

use crate::config::{ConnectionConfig, ToolSettings};
use crate::connection::{Connector, MySqlConnector};
use crate::envelope::ResultEnvelope;
use crate::error::DatabaseToolError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use zdk_core::{Result as ZResult, Tool, ToolContext, ToolResponse, ZConfig};
use zdk_telemetry::{DbSpanAttributes, trace_db_call};
use zdk_tool::ToolSchema;

pub const MYSQL_QUERY_TOOL: &str = "mysql_query";
pub const MYSQL_PROCEDURE_TOOL: &str = "mysql_execute_procedure";
pub const DATA_ANALYSIS_TOOL: &str = "data_analysis";

/// Create the MySQL tools backed by a real server
///
/// Connection defaults and the timeout come from the `[mysql]` section of
/// `config`; fields the section leaves out keep the built-in defaults. A
/// zero timeout is a configuration error.
pub fn create_mysql_tools(config: &ZConfig) -> ZResult<Vec<Arc<dyn Tool>>> {
    create_mysql_tools_with(
        Arc::new(MySqlConnector::new()),
        ToolSettings::from_config(config)?,
    )
}

/// Create the MySQL tools over any [`Connector`]
pub fn create_mysql_tools_with(
    connector: Arc<dyn Connector>,
    settings: ToolSettings,
) -> ZResult<Vec<Arc<dyn Tool>>> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(crate::query::create_query_tool(
            connector.clone(),
            settings.clone(),
        )?),
        Arc::new(crate::procedure::create_procedure_tool(
            connector.clone(),
            settings.clone(),
        )?),
        Arc::new(crate::analysis::create_analysis_tool(connector, settings)?),
    ];

    tracing::debug!(count = tools.len(), "Created MySQL tools");

    Ok(tools)
}

/// Deserialize tool arguments; a missing argument object counts as `{}`
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, DatabaseToolError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(params)?)
}

/// Add the five connection fields to `schema`
///
/// With `defaults` each field advertises its default value. A configured
/// password is never written into a schema.
pub(crate) fn connection_properties(
    schema: ToolSchema,
    defaults: Option<&ConnectionConfig>,
) -> ToolSchema {
    let Some(defaults) = defaults else {
        return schema
            .property("host", "string", "MySQL server host")
            .property("port", "integer", "MySQL server port")
            .property("user", "string", "MySQL user name")
            .property("password", "string", "MySQL password")
            .property("database", "string", "Database to use");
    };

    let schema = schema
        .property_with_default("host", "string", "MySQL server host", defaults.host.as_str())
        .property_with_default("port", "integer", "MySQL server port", defaults.port)
        .property_with_default("user", "string", "MySQL user name", defaults.user.as_str());

    let schema = if defaults.password.is_empty() {
        schema.property_with_default("password", "string", "MySQL password", "")
    } else {
        schema.property(
            "password",
            "string",
            "MySQL password (defaults to the configured one)",
        )
    };

    schema.property_with_default(
        "database",
        "string",
        "Database to use",
        defaults.database.as_str(),
    )
}

/// What a finished call touched, for logs and the call span
pub(crate) struct CallRecord<'a> {
    pub tool: &'static str,
    pub operation: &'static str,
    pub statement: &'a str,
    pub config: &'a ConnectionConfig,
}

/// Log the outcome, record the span and hand the envelope back to the agent
pub(crate) fn finish_call(
    ctx: &Arc<dyn ToolContext>,
    call: CallRecord<'_>,
    envelope: ResultEnvelope,
) -> ZResult<ToolResponse> {
    match &envelope {
        ResultEnvelope::Success { data } => {
            let rows = data.as_array().map(Vec::len);
            tracing::info!(
                tool = call.tool,
                invocation_id = %ctx.invocation_id(),
                database = %call.config.database,
                rows = ?rows,
                "MySQL tool call succeeded"
            );
        }
        ResultEnvelope::Error { message } => {
            tracing::warn!(
                tool = call.tool,
                invocation_id = %ctx.invocation_id(),
                database = %call.config.database,
                error = %message,
                "MySQL tool call failed"
            );
        }
    }

    trace_db_call(DbSpanAttributes {
        tool_name: call.tool.to_string(),
        tool_call_id: ctx.function_call_id().to_string(),
        invocation_id: ctx.invocation_id().to_string(),
        operation: call.operation.to_string(),
        statement: call.statement.to_string(),
        database: call.config.database.clone(),
        host: call.config.host.clone(),
        port: call.config.port,
        status: envelope.status().to_string(),
    });

    envelope.into_tool_response()
}

/// Answer a call whose arguments could not be used; nothing was opened
pub(crate) fn reject(
    ctx: &Arc<dyn ToolContext>,
    tool: &'static str,
    err: DatabaseToolError,
) -> ZResult<ToolResponse> {
    tracing::warn!(
        tool,
        invocation_id = %ctx.invocation_id(),
        error = %err,
        "Rejected MySQL tool call"
    );
    ResultEnvelope::from(err).into_tool_response()
}
