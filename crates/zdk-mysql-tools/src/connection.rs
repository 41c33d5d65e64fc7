//! Connection lifecycle: open one session per tool call, always release it

use crate::config::ConnectionConfig;
use crate::error::DatabaseToolError;
use crate::row::{Row, mysql_row_to_json};
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection};
use sqlx::query::Query;
use sqlx::{Connection, Either, Executor, MySql};
use std::future::Future;
use std::time::Duration;

/// Opens database sessions
///
/// The production implementation is [`MySqlConnector`]; tests substitute an
/// instrumented fake.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ConnectionConfig)
    -> Result<Box<dyn Session>, DatabaseToolError>;
}

/// One open database connection
#[async_trait]
pub trait Session: Send {
    /// Run SQL as written and return every row it produced
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseToolError>;

    /// Prepare `sql`, bind `args` to its `?` placeholders in order and
    /// return the row-bearing result sets in order
    async fn fetch_result_sets(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Vec<Row>>, DatabaseToolError>;

    /// Close the connection gracefully
    async fn close(self: Box<Self>) -> Result<(), DatabaseToolError>;
}

/// Session scoped to a single tool call
///
/// Call [`ScopedSession::release`] on every path once the work is done. If
/// the guard is dropped instead (the call was cancelled or panicked) the
/// underlying connection is dropped without the graceful close.
pub struct ScopedSession {
    inner: Option<Box<dyn Session>>,
    timeout: Duration,
}

impl ScopedSession {
    pub async fn open(
        connector: &dyn Connector,
        config: &ConnectionConfig,
        timeout: Duration,
    ) -> Result<Self, DatabaseToolError> {
        tracing::debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Opening MySQL session"
        );

        let session = with_timeout(timeout, "connecting", connector.connect(config)).await?;

        Ok(Self {
            inner: Some(session),
            timeout,
        })
    }

    pub async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseToolError> {
        let timeout = self.timeout;
        let session = self.session()?;
        with_timeout(timeout, "running query", session.fetch_all(sql)).await
    }

    pub async fn fetch_result_sets(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Vec<Row>>, DatabaseToolError> {
        let timeout = self.timeout;
        let session = self.session()?;
        with_timeout(
            timeout,
            "calling procedure",
            session.fetch_result_sets(sql, args),
        )
        .await
    }

    /// Close the session; failures are logged, never returned
    pub async fn release(mut self) {
        if let Some(session) = self.inner.take() {
            match with_timeout(self.timeout, "closing connection", session.close()).await {
                Ok(()) => tracing::debug!("MySQL session released"),
                Err(e) => tracing::warn!(error = %e, "MySQL session did not close cleanly"),
            }
        }
    }

    fn session(&mut self) -> Result<&mut Box<dyn Session>, DatabaseToolError> {
        self.inner
            .as_mut()
            .ok_or_else(|| DatabaseToolError::Database("Connection already released".to_string()))
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            tracing::warn!("MySQL session dropped without release; connection closed abruptly");
        }
    }
}

async fn with_timeout<T, F>(
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, DatabaseToolError>
where
    F: Future<Output = Result<T, DatabaseToolError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| DatabaseToolError::Timeout {
            limit: timeout,
            operation,
        })?
}

/// Connector backed by a single `sqlx` MySQL connection per call
#[derive(Debug, Clone, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    /// Connect options for `config`
    ///
    /// The session keeps the server's own `sql_mode` and `time_zone`: sqlx
    /// would otherwise append `PIPES_AS_CONCAT` and `NO_ENGINE_SUBSTITUTION`
    /// and force UTC, changing what the caller's SQL means.
    pub(crate) fn options(config: &ConnectionConfig) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .pipes_as_concat(false)
            .no_engine_substitution(false)
            .timezone(None::<String>);

        if config.database.is_empty() {
            options
        } else {
            options.database(&config.database)
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Session>, DatabaseToolError> {
        let conn = MySqlConnection::connect_with(&Self::options(config)).await?;
        Ok(Box::new(MySqlSession { conn }))
    }
}

/// Plain statements go through the text protocol (`COM_QUERY`) so that
/// anything the server accepts runs unchanged, including multi-statement
/// batches. Procedure calls are prepared and their arguments bound.
struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MySqlSession {
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseToolError> {
        let rows = (&mut self.conn).fetch_all(sqlx::raw_sql(sql)).await?;
        rows.iter().map(mysql_row_to_json).collect()
    }

    async fn fetch_result_sets(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Vec<Row>>, DatabaseToolError> {
        let query = args.iter().try_fold(sqlx::query(sql), bind_json)?;

        let mut sets = Vec::new();
        let mut current = Vec::new();
        let mut stream = (&mut self.conn).fetch_many(query);

        while let Some(item) = stream.try_next().await? {
            match item {
                // End of one result set
                Either::Left(_) => {
                    if !current.is_empty() {
                        sets.push(std::mem::take(&mut current));
                    }
                }
                Either::Right(row) => current.push(mysql_row_to_json(&row)?),
            }
        }

        if !current.is_empty() {
            sets.push(current);
        }

        Ok(sets)
    }

    async fn close(self: Box<Self>) -> Result<(), DatabaseToolError> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Bind one scalar JSON value with its natural MySQL type
fn bind_json<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Result<Query<'q, MySql, MySqlArguments>, DatabaseToolError> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(u) = n.as_u64() {
                query.bind(u)
            } else {
                query.bind(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        Value::Array(_) | Value::Object(_) => {
            return Err(DatabaseToolError::InvalidParameters(
                "Procedure parameters must be strings, numbers, booleans or null".to_string(),
            ));
        }
    })
}
