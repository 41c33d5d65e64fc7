//! `data_analysis`: statistics over the numeric columns of a query result

pub mod dataset;
pub mod regression;
pub mod stats;

pub use dataset::AnalysisDataset;
pub use regression::RegressionReport;

use crate::config::{ConnectionConfig, RequiredConnection, ToolSettings};
use crate::connection::{Connector, ScopedSession};
use crate::envelope::ResultEnvelope;
use crate::error::DatabaseToolError;
use crate::tools::{
    CallRecord, DATA_ANALYSIS_TOOL, connection_properties, finish_call, parse_params, reject,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use zdk_core::Result as ZResult;
use zdk_tool::{FunctionTool, ToolSchema};

/// Arguments of `data_analysis`
///
/// `analysis_type` stays a string here: an unknown kind is only reported
/// after the query has run.
#[derive(Clone, Deserialize)]
pub struct AnalysisArgs {
    pub connection: RequiredConnection,
    pub analysis_type: String,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Descriptive,
    Correlation,
    LinearRegression,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Descriptive,
        AnalysisKind::Correlation,
        AnalysisKind::LinearRegression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Descriptive => "descriptive",
            AnalysisKind::Correlation => "correlation",
            AnalysisKind::LinearRegression => "linear_regression",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = DatabaseToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DatabaseToolError::UnsupportedAnalysis(s.to_string()))
    }
}

/// Result payload of one analysis
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnalysisOutput {
    Table(Map<String, Value>),
    Regression(RegressionReport),
}

/// Run `query`, keep its numeric columns, impute gaps and analyse
///
/// The connection is released as soon as the rows are in memory; the
/// statistics run without holding it.
pub async fn execute_analysis(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    analysis_type: &str,
    query: &str,
    timeout: Duration,
) -> ResultEnvelope {
    ResultEnvelope::from_result(run_analysis(connector, config, analysis_type, query, timeout).await)
}

async fn run_analysis(
    connector: &dyn Connector,
    config: &ConnectionConfig,
    analysis_type: &str,
    query: &str,
    timeout: Duration,
) -> Result<AnalysisOutput, DatabaseToolError> {
    let mut session = ScopedSession::open(connector, config, timeout).await?;
    let rows = session.fetch_all(query).await;
    session.release().await;
    let rows = rows?;

    let dataset = AnalysisDataset::from_rows(&rows);
    let kind: AnalysisKind = analysis_type.parse()?;

    if dataset.width() == 0 {
        return Err(DatabaseToolError::NoNumericColumns);
    }

    tracing::debug!(
        kind = %kind,
        rows = dataset.len(),
        columns = ?dataset.columns(),
        "Running analysis"
    );

    Ok(match kind {
        AnalysisKind::Descriptive => AnalysisOutput::Table(stats::describe(&dataset)),
        AnalysisKind::Correlation => AnalysisOutput::Table(stats::correlation(&dataset)),
        AnalysisKind::LinearRegression => {
            AnalysisOutput::Regression(regression::linear_regression(&dataset)?)
        }
    })
}

pub(crate) fn create_analysis_tool(
    connector: Arc<dyn Connector>,
    settings: ToolSettings,
) -> ZResult<FunctionTool> {
    let connection = ["host", "port", "user", "password", "database"]
        .into_iter()
        .fold(connection_properties(ToolSchema::new(), None), |schema, field| {
            schema.required(field)
        });
    let kinds: Vec<&str> = AnalysisKind::ALL.iter().map(AnalysisKind::as_str).collect();

    let schema = ToolSchema::new()
        .object_property("connection", "MySQL connection parameters", connection)
        .enum_property("analysis_type", "Type of analysis to perform", &kinds)
        .property(
            "query",
            "string",
            "SQL query to execute to retrieve data from the database",
        )
        .required("connection")
        .required("analysis_type")
        .required("query")
        .build();

    FunctionTool::builder()
        .name(DATA_ANALYSIS_TOOL)
        .description("Perform data analysis on local data selected from mysql database.")
        .schema(schema)
        .execute(move |ctx, params| {
            let connector = connector.clone();
            let timeout = settings.timeout;
            async move {
                let args: AnalysisArgs = match parse_params(params) {
                    Ok(args) => args,
                    Err(e) => return reject(&ctx, DATA_ANALYSIS_TOOL, e),
                };
                let config = ConnectionConfig::from(args.connection);

                tracing::debug!(
                    invocation_id = %ctx.invocation_id(),
                    analysis_type = %args.analysis_type,
                    database = %config.database,
                    "Executing data analysis"
                );

                let envelope = execute_analysis(
                    connector.as_ref(),
                    &config,
                    &args.analysis_type,
                    &args.query,
                    timeout,
                )
                .await;

                finish_call(
                    &ctx,
                    CallRecord {
                        tool: DATA_ANALYSIS_TOOL,
                        operation: "analysis",
                        statement: &args.query,
                        config: &config,
                    },
                    envelope,
                )
            }
        })
        .build()
}
