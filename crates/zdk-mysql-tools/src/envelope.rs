//! Uniform result wrapper returned by every tool call

use crate::error::DatabaseToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zdk_core::{Result as ZResult, ToolResponse};

/// `{"status": "success", "data": ...}` or `{"status": "error", "message": ...}`
///
/// Exactly one of `data` / `message` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResultEnvelope {
    Success { data: Value },
    Error { message: String },
}

impl ResultEnvelope {
    /// Success envelope around any serializable payload
    pub fn success<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::Success { data },
            Err(e) => Self::error(format!("Failed to serialize result: {}", e)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn from_result<T: Serialize>(result: Result<T, DatabaseToolError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => e.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Error { .. } => "error",
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data } => Some(data),
            Self::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { message } => Some(message),
        }
    }

    pub fn into_tool_response(self) -> ZResult<ToolResponse> {
        ToolResponse::from_serialize(&self)
    }
}

impl From<DatabaseToolError> for ResultEnvelope {
    fn from(err: DatabaseToolError) -> Self {
        Self::error(err.to_string())
    }
}
