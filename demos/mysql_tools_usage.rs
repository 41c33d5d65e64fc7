//! MySQL Tools Example
//!
//! Builds the three MySQL tools from `config.toml` and runs one call of each,
//! printing the result envelopes. Point `[mysql]` at a server first; without
//! one every call still answers, with an error envelope.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use zdk_core::{LogFormat, Tool, ZConfig};
use zdk_mysql_tools::{
    DATA_ANALYSIS_TOOL, MYSQL_PROCEDURE_TOOL, MYSQL_QUERY_TOOL, create_mysql_tools,
};
use zdk_telemetry::{TelemetryOptions, init_telemetry};
use zdk_tool::DefaultToolContext;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ZConfig::load_or_default()?;

    init_telemetry(TelemetryOptions {
        service_name: config.observability.service_name.clone(),
        json_logs: config.observability.log_format == LogFormat::Json,
    });

    tracing::info!("=== MySQL Tools Example ===");

    let tools = create_mysql_tools(&config)?;
    for tool in &tools {
        tracing::info!(tool = %tool.name(), "{}", tool.description());
    }

    let mysql = &config.mysql;
    let connection = json!({
        "host": mysql.host.clone().unwrap_or_else(|| "localhost".to_string()),
        "port": mysql.port.unwrap_or(3306),
        "user": mysql.user.clone().unwrap_or_else(|| "root".to_string()),
        "password": mysql.password.clone().unwrap_or_default(),
        "database": mysql.database.clone().unwrap_or_else(|| "openmanus".to_string()),
    });

    // Example 1: plain query
    run(
        &tools,
        MYSQL_QUERY_TOOL,
        json!({"query": "SELECT 1 AS x, NOW() AS server_time"}),
    )
    .await?;

    // Example 2: stored procedure with positional arguments
    run(
        &tools,
        MYSQL_PROCEDURE_TOOL,
        json!({
            "connection": {},
            "procedure": "get_orders",
            "parameters": ["2024-01-01", 10]
        }),
    )
    .await?;

    // Example 3: descriptive statistics over an ad-hoc table
    run(
        &tools,
        DATA_ANALYSIS_TOOL,
        json!({
            "connection": connection,
            "analysis_type": "descriptive",
            "query": "SELECT 1 AS a, 10 AS target UNION ALL SELECT 2, 21 UNION ALL SELECT 3, 29"
        }),
    )
    .await?;

    Ok(())
}

async fn run(tools: &[Arc<dyn Tool>], name: &str, params: serde_json::Value) -> Result<()> {
    let tool = tools
        .iter()
        .find(|t| t.name() == name)
        .ok_or_else(|| anyhow::anyhow!("Tool {} not found", name))?;

    let ctx = Arc::new(DefaultToolContext::standalone(format!("demo-{}", name)));
    let response = tool.execute(ctx, params).await?;

    println!("{}:\n{}\n", name, serde_json::to_string_pretty(&response.result)?);
    Ok(())
}
