//! Error types for the MySQL tools

use std::time::Duration;
use thiserror::Error;

/// Failures a tool call can end with
///
/// Every variant ends up as the `message` of an error envelope. Local
/// validation failures never touch the database; `Database` and `Timeout`
/// come from the engine or the network.
#[derive(Error, Debug)]
pub enum DatabaseToolError {
    /// Parameters did not match the tool schema
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// `analysis_type` outside the supported set
    #[error("Unsupported analysis type: {0}")]
    UnsupportedAnalysis(String),

    /// Not enough rows for the requested analysis
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Query result had no numeric column left after filtering
    #[error("Query returned no numeric columns to analyse")]
    NoNumericColumns,

    /// Connect or statement did not finish in time
    #[error("Timed out after {} while {operation}", format_limit(.limit))]
    Timeout {
        limit: Duration,
        operation: &'static str,
    },

    /// Error text reported by the driver or the server
    #[error("{0}")]
    Database(String),
}

/// Whole seconds, or milliseconds for limits under a second
fn format_limit(limit: &Duration) -> String {
    if limit.as_secs() == 0 {
        format!("{}ms", limit.as_millis())
    } else if limit.subsec_millis() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{:.1}s", limit.as_secs_f64())
    }
}

/// Server errors keep the engine's own `code (state): message` text
impl From<sqlx::Error> for DatabaseToolError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DatabaseToolError::Database(db_err.to_string()),
            sqlx::Error::Io(io_err) => {
                DatabaseToolError::Database(format!("Can't connect to MySQL server: {}", io_err))
            }
            sqlx::Error::PoolTimedOut => DatabaseToolError::Database(
                "Timed out waiting for a MySQL connection".to_string(),
            ),
            other => DatabaseToolError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DatabaseToolError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseToolError::InvalidParameters(err.to_string())
    }
}
