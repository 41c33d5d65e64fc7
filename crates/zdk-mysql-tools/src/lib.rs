//! MySQL tools for ZDK agents
//!
//! This crate provides three tools that let an agent work with a MySQL
//! database: `mysql_query` runs arbitrary SQL, `mysql_execute_procedure`
//! calls a stored procedure, and `data_analysis` runs descriptive
//! statistics, correlation or linear regression over a query result.
//!
//! Every tool opens one connection per call, releases it on every exit
//! path, and answers with a [`ResultEnvelope`].

pub mod analysis;
pub mod config;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod procedure;
pub mod query;
pub mod row;
pub mod tools;

// Re-exports
pub use analysis::{AnalysisArgs, AnalysisKind, execute_analysis};
pub use config::{ConnectionConfig, ConnectionOverrides, RequiredConnection, ToolSettings};
pub use connection::{Connector, MySqlConnector, ScopedSession, Session};
pub use envelope::ResultEnvelope;
pub use error::DatabaseToolError;
pub use procedure::{ProcedureArgs, ProcedureParameters, execute_procedure};
pub use query::{QueryArgs, execute_query};
pub use row::Row;
pub use tools::{
    DATA_ANALYSIS_TOOL, MYSQL_PROCEDURE_TOOL, MYSQL_QUERY_TOOL, create_mysql_tools,
    create_mysql_tools_with,
};
