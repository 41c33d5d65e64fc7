//! `mysql_query`: run one SQL string and return every row it produced

use crate::config::{ConnectionConfig, ConnectionOverrides, ToolSettings};
use crate::connection::{Connector, ScopedSession};
use crate::envelope::ResultEnvelope;
use crate::error::DatabaseToolError;
use crate::row::Row;
use crate::tools::{
    CallRecord, MYSQL_QUERY_TOOL, connection_properties, finish_call, parse_params, reject,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use zdk_core::Result as ZResult;
use zdk_tool::{FunctionTool, ToolSchema};

/// Arguments of `mysql_query`; connection fields sit next to `query`
#[derive(Debug, Clone, Deserialize)]
pub struct QueryArgs {
    pub query: String,
    #[serde(flatten)]
    pub connection: ConnectionOverrides,
}

/// Run `query` as written on a fresh connection
///
/// No parameter binding and no statement filtering; writes and DDL go
/// through unchanged. The connection is released before the envelope is
/// built, whatever the outcome.
pub async fn execute_query(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    query: &str,
    timeout: Duration,
) -> ResultEnvelope {
    ResultEnvelope::from_result(run_query(connector, config, query, timeout).await)
}

async fn run_query(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    query: &str,
    timeout: Duration,
) -> Result<Vec<Row>, DatabaseToolError> {
    let mut session = ScopedSession::open(connector, config, timeout).await?;
    let rows = session.fetch_all(query).await;
    session.release().await;
    rows
}

pub(crate) fn create_query_tool(
    connector: Arc<dyn Connector>,
    settings: ToolSettings,
) -> ZResult<FunctionTool> {
    let schema = ToolSchema::new().property("query", "string", "SQL query to execute");
    let schema = connection_properties(schema, Some(&settings.defaults))
        .required("query")
        .build();

    FunctionTool::builder()
        .name(MYSQL_QUERY_TOOL)
        .description("Execute SQL query on MySQL database")
        .schema(schema)
        .execute(move |ctx, params| {
            let connector = connector.clone();
            let settings = settings.clone();
            async move {
                let args: QueryArgs = match parse_params(params) {
                    Ok(args) => args,
                    Err(e) => return reject(&ctx, MYSQL_QUERY_TOOL, e),
                };
                let config = args.connection.resolve(&settings.defaults);

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    host = %config.host,
                    database = %config.database,
                    "Executing MySQL query"
                );

                let envelope =
                    execute_query(connector.as_ref(), &config, &args.query, settings.timeout)
                        .await;

                finish_call(
                    &ctx,
                    CallRecord {
                        tool: MYSQL_QUERY_TOOL,
                        operation: "query",
                        statement: &args.query,
                        config: &config,
                    },
                    envelope,
                )
            }
        })
        .build()
}
