// Integration tests for the MySQL tools
// The tools are driven through the Tool trait against a scripted connector

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zdk_core::Tool;
use zdk_mysql_tools::{
    ConnectionConfig, Connector, DATA_ANALYSIS_TOOL, DatabaseToolError, MYSQL_PROCEDURE_TOOL,
    MYSQL_QUERY_TOOL, Row, Session, ToolSettings, create_mysql_tools_with,
};
use zdk_tool::DefaultToolContext;

// Counts connects and closes, records every statement and its bound values
#[derive(Default)]
struct Recorder {
    connects: AtomicUsize,
    closes: AtomicUsize,
    statements: Mutex<Vec<String>>,
    arguments: Mutex<Vec<Vec<Value>>>,
    configs: Mutex<Vec<ConnectionConfig>>,
}

#[derive(Clone, Default)]
struct FakeConnector {
    recorder: Arc<Recorder>,
    refuse_connect: Option<String>,
    fail_statement: Option<String>,
    rows: Vec<Row>,
    result_sets: Vec<Vec<Row>>,
}

impl FakeConnector {
    fn with_rows(rows: Value) -> Self {
        Self {
            rows: serde_json::from_value(rows).unwrap(),
            ..Default::default()
        }
    }

    fn with_result_sets(sets: Value) -> Self {
        Self {
            result_sets: serde_json::from_value(sets).unwrap(),
            ..Default::default()
        }
    }

    fn refusing(message: &str) -> Self {
        Self {
            refuse_connect: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            fail_statement: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn connects(&self) -> usize {
        self.recorder.connects.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.recorder.closes.load(Ordering::SeqCst)
    }

    fn statements(&self) -> Vec<String> {
        self.recorder.statements.lock().unwrap().clone()
    }

    fn arguments(&self) -> Vec<Vec<Value>> {
        self.recorder.arguments.lock().unwrap().clone()
    }

    fn last_config(&self) -> ConnectionConfig {
        self.recorder.configs.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Session>, DatabaseToolError> {
        self.recorder.configs.lock().unwrap().push(config.clone());

        if let Some(message) = &self.refuse_connect {
            return Err(DatabaseToolError::Database(message.clone()));
        }

        self.recorder.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            connector: self.clone(),
        }))
    }
}

struct FakeSession {
    connector: FakeConnector,
}

impl FakeSession {
    fn record(&self, sql: &str) -> Result<(), DatabaseToolError> {
        self.connector
            .recorder
            .statements
            .lock()
            .unwrap()
            .push(sql.to_string());

        match &self.connector.fail_statement {
            Some(message) => Err(DatabaseToolError::Database(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseToolError> {
        self.record(sql)?;
        Ok(self.connector.rows.clone())
    }

    async fn fetch_result_sets(
        &mut self,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Vec<Row>>, DatabaseToolError> {
        self.connector
            .recorder
            .arguments
            .lock()
            .unwrap()
            .push(args.to_vec());
        self.record(sql)?;
        Ok(self.connector.result_sets.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), DatabaseToolError> {
        self.connector.recorder.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn tool(connector: &FakeConnector, name: &str) -> Arc<dyn Tool> {
    let settings = ToolSettings::default().with_timeout(Duration::from_secs(5));
    create_mysql_tools_with(Arc::new(connector.clone()), settings)
        .unwrap()
        .into_iter()
        .find(|t| t.name() == name)
        .unwrap()
}

async fn call(tool: &Arc<dyn Tool>, params: Value) -> Value {
    let ctx = Arc::new(DefaultToolContext::new("call-1", "inv-1"));
    tool.execute(ctx, params).await.unwrap().result
}

fn analysis_params(kind: &str) -> Value {
    json!({
        "connection": {
            "host": "db.test",
            "port": 3306,
            "user": "analyst",
            "password": "pw",
            "database": "sales"
        },
        "analysis_type": kind,
        "query": "SELECT * FROM measurements"
    })
}

#[tokio::test]
async fn test_query_success_envelope() {
    let connector = FakeConnector::with_rows(json!([{"x": 1}]));
    let result = call(&tool(&connector, MYSQL_QUERY_TOOL), json!({"query": "SELECT 1 AS x"})).await;

    assert_eq!(result, json!({"status": "success", "data": [{"x": 1}]}));
    assert!(result.get("message").is_none());
    assert_eq!(connector.statements(), vec!["SELECT 1 AS x"]);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_query_applies_defaults() {
    let connector = FakeConnector::with_rows(json!([]));
    let result = call(
        &tool(&connector, MYSQL_QUERY_TOOL),
        json!({"query": "DELETE FROM t", "database": "scratch"}),
    )
    .await;

    assert_eq!(result, json!({"status": "success", "data": []}));

    let config = connector.last_config();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 3306);
    assert_eq!(config.user, "root");
    assert_eq!(config.password, "");
    assert_eq!(config.database, "scratch");
}

#[tokio::test]
async fn test_connect_failure_is_error_envelope() {
    let calls = [
        (MYSQL_QUERY_TOOL, json!({"query": "SELECT 1"})),
        (
            MYSQL_PROCEDURE_TOOL,
            json!({"connection": {}, "procedure": "order_summary", "parameters": [1]}),
        ),
        (DATA_ANALYSIS_TOOL, analysis_params("descriptive")),
    ];

    for (name, params) in calls {
        let connector =
            FakeConnector::refusing("Can't connect to MySQL server on 'localhost:3306'");
        let result = call(&tool(&connector, name), params).await;

        assert_eq!(result["status"], "error", "{}", name);
        assert!(
            !result["message"].as_str().unwrap_or_default().is_empty(),
            "{} returned no message",
            name
        );
        assert!(result.get("data").is_none(), "{}", name);
        assert_eq!(connector.connects(), 0, "{}", name);
        assert_eq!(connector.closes(), 0, "{}", name);
    }
}

#[tokio::test]
async fn test_engine_error_keeps_message_and_releases() {
    let message = "1146 (42S02): Table 'openmanus.missing' doesn't exist";
    let connector = FakeConnector::failing(message);
    let result = call(
        &tool(&connector, MYSQL_QUERY_TOOL),
        json!({"query": "SELECT * FROM missing"}),
    )
    .await;

    assert_eq!(result, json!({"status": "error", "message": message}));
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_missing_query_rejected_without_connecting() {
    let connector = FakeConnector::default();
    let result = call(&tool(&connector, MYSQL_QUERY_TOOL), Value::Null).await;

    assert_eq!(result["status"], "error");
    assert!(
        result["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid parameters")
    );
    assert_eq!(connector.recorder.configs.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn test_procedure_collects_result_sets() {
    let connector = FakeConnector::with_result_sets(json!([
        [{"id": 1}, {"id": 2}],
        [{"total": 2}]
    ]));
    let result = call(
        &tool(&connector, MYSQL_PROCEDURE_TOOL),
        json!({
            "connection": {"database": "shop"},
            "procedure": "order_summary",
            "parameters": {"customer": "O'Hara", "limit": 10}
        }),
    )
    .await;

    assert_eq!(
        result,
        json!({"status": "success", "data": [[{"id": 1}, {"id": 2}], [{"total": 2}]]})
    );
    assert!(result.get("message").is_none());
    assert_eq!(connector.statements(), vec!["CALL `order_summary`(?, ?)"]);
    assert_eq!(connector.arguments(), vec![vec![json!("O'Hara"), json!(10)]]);
    assert_eq!(connector.last_config().database, "shop");
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_procedure_string_arguments_are_bound_not_spliced() {
    let connector = FakeConnector::with_result_sets(json!([]));
    let argument = "x\\', 1); DROP TABLE t; -- ";
    let result = call(
        &tool(&connector, MYSQL_PROCEDURE_TOOL),
        json!({"connection": {}, "procedure": "audit", "parameters": [argument]}),
    )
    .await;

    assert_eq!(result["status"], "success");
    assert_eq!(connector.statements(), vec!["CALL `audit`(?)"]);
    assert_eq!(connector.arguments(), vec![vec![json!(argument)]]);
}

#[tokio::test]
async fn test_procedure_engine_error_keeps_message_and_releases() {
    let message = "1305 (42000): PROCEDURE openmanus.missing_proc does not exist";
    let connector = FakeConnector::failing(message);
    let result = call(
        &tool(&connector, MYSQL_PROCEDURE_TOOL),
        json!({"connection": {}, "procedure": "missing_proc"}),
    )
    .await;

    assert_eq!(result, json!({"status": "error", "message": message}));
    assert!(result["message"].as_str().unwrap().contains("does not exist"));
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_procedure_without_parameters() {
    let connector = FakeConnector::with_result_sets(json!([]));
    let result = call(
        &tool(&connector, MYSQL_PROCEDURE_TOOL),
        json!({"connection": {}, "procedure": "reporting.refresh"}),
    )
    .await;

    assert_eq!(result, json!({"status": "success", "data": []}));
    assert_eq!(connector.statements(), vec!["CALL `reporting`.`refresh`()"]);
}

#[tokio::test]
async fn test_invalid_procedure_name_opens_no_connection() {
    let connector = FakeConnector::default();
    let result = call(
        &tool(&connector, MYSQL_PROCEDURE_TOOL),
        json!({"connection": {}, "procedure": "x(); DROP TABLE users; --"}),
    )
    .await;

    assert_eq!(result["status"], "error");
    assert!(
        result["message"]
            .as_str()
            .unwrap()
            .contains("Invalid procedure name")
    );
    assert_eq!(connector.recorder.configs.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unsupported_analysis_runs_query_first() {
    let connector = FakeConnector::with_rows(json!([{"v": 1}, {"v": 2}]));
    let result = call(
        &tool(&connector, DATA_ANALYSIS_TOOL),
        analysis_params("clustering"),
    )
    .await;

    assert_eq!(
        result,
        json!({"status": "error", "message": "Unsupported analysis type: clustering"})
    );
    assert_eq!(connector.statements(), vec!["SELECT * FROM measurements"]);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_descriptive_imputes_missing_values() {
    let connector = FakeConnector::with_rows(json!([
        {"label": "a", "v": 1},
        {"label": "b", "v": null},
        {"label": "c", "v": 3}
    ]));
    let result = call(
        &tool(&connector, DATA_ANALYSIS_TOOL),
        analysis_params("descriptive"),
    )
    .await;

    assert_eq!(result["status"], "success");
    assert!(result.get("message").is_none());
    let data = result["data"].as_object().unwrap();
    assert_eq!(data.keys().collect::<Vec<_>>(), vec!["v"]);
    assert_eq!(data["v"]["count"], 3.0);
    assert_eq!(data["v"]["mean"], 2.0);
    assert_eq!(data["v"]["50%"], 2.0);
    assert_eq!(data["v"]["std"], 1.0);
}

#[tokio::test]
async fn test_correlation() {
    let connector = FakeConnector::with_rows(json!([
        {"a": 1, "b": 10},
        {"a": 2, "b": 20},
        {"a": 3, "b": 30}
    ]));
    let result = call(
        &tool(&connector, DATA_ANALYSIS_TOOL),
        analysis_params("correlation"),
    )
    .await;

    assert_eq!(result["status"], "success");
    assert!(result.get("message").is_none());
    assert_eq!(result["data"]["a"]["a"], 1.0);
    assert!((result["data"]["a"]["b"].as_f64().unwrap() - 1.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_regression_uses_target_column() {
    let rows: Vec<Value> = (0..10)
        .map(|i| json!({"target": 4 * i + 1, "x": i, "noise_free": 5}))
        .collect();
    let connector = FakeConnector::with_rows(Value::Array(rows));
    let result = call(
        &tool(&connector, DATA_ANALYSIS_TOOL),
        analysis_params("linear_regression"),
    )
    .await;

    assert_eq!(result["status"], "success");
    assert!(result.get("message").is_none());
    let data = &result["data"];
    assert_eq!(data["target"], "target");
    assert_eq!(data["features"], json!(["x", "noise_free"]));
    assert!((data["model_coefficients"][0].as_f64().unwrap() - 4.0).abs() < 1e-9);
    assert_eq!(data["model_coefficients"][1], 0.0);
    assert!((data["model_intercept"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert!(data["mean_squared_error"].as_f64().unwrap() < 1e-12);
}

#[tokio::test]
async fn test_regression_with_one_row_is_insufficient() {
    let connector = FakeConnector::with_rows(json!([{"x": 1, "y": 2}]));
    let result = call(
        &tool(&connector, DATA_ANALYSIS_TOOL),
        analysis_params("linear_regression"),
    )
    .await;

    assert_eq!(result["status"], "error");
    assert!(
        result["message"]
            .as_str()
            .unwrap()
            .starts_with("Insufficient data")
    );
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_no_numeric_columns() {
    let connector = FakeConnector::with_rows(json!([{"name": "a"}, {"name": "b"}]));
    let result = call(
        &tool(&connector, DATA_ANALYSIS_TOOL),
        analysis_params("descriptive"),
    )
    .await;

    assert_eq!(result["status"], "error");
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_analysis_requires_full_connection() {
    let connector = FakeConnector::with_rows(json!([{"v": 1}]));
    let mut params = analysis_params("descriptive");
    params["connection"].as_object_mut().unwrap().remove("password");

    let result = call(&tool(&connector, DATA_ANALYSIS_TOOL), params).await;

    assert_eq!(result["status"], "error");
    assert!(result["message"].as_str().unwrap().contains("password"));
    assert_eq!(connector.recorder.configs.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn test_every_call_releases_exactly_once() {
    let connector = FakeConnector::with_rows(json!([{"v": 1}, {"v": 2}, {"v": 4}]));
    let tools = create_mysql_tools_with(Arc::new(connector.clone()), ToolSettings::default())
        .unwrap();

    let calls = [
        (MYSQL_QUERY_TOOL, json!({"query": "SELECT v FROM t"})),
        (
            MYSQL_PROCEDURE_TOOL,
            json!({"connection": {}, "procedure": "p", "parameters": [1]}),
        ),
        (DATA_ANALYSIS_TOOL, analysis_params("descriptive")),
        (DATA_ANALYSIS_TOOL, analysis_params("correlation")),
        (DATA_ANALYSIS_TOOL, analysis_params("linear_regression")),
        (DATA_ANALYSIS_TOOL, analysis_params("unknown")),
    ];

    for (i, (name, params)) in calls.into_iter().enumerate() {
        let tool = tools.iter().find(|t| t.name() == name).unwrap();
        call(tool, params).await;
        assert_eq!(connector.connects(), i + 1);
        assert_eq!(connector.closes(), i + 1, "{} left its connection open", name);
    }
}
