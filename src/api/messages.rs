//! Request and response messages for the binding API.
//!
//! Field names are camelCase on the wire. Every response uses the same
//! envelope: `{code, message, success, data}` on success and
//! `{code, message, success: false, error}` on failure.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolbindError;
use crate::id::{CategoryId, ToolId};

/// Method names understood by the dispatcher.
pub mod methods {
    pub const BOUND: &str = "binding.bound";
    pub const UNBOUND: &str = "binding.unbound";
    pub const BIND: &str = "binding.bind";
}

/// A method call with JSON parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Method name (e.g., "binding.bind").
    pub method: String,
    /// Method parameters as JSON value.
    #[serde(default)]
    pub params: Value,
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Parameters of `binding.bound` and `binding.unbound`.
///
/// `agentId` is kept raw here and validated by the handler so that a bad
/// value reports the field instead of a generic parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

pub type BoundToolsRequest = MembershipRequest;
pub type UnboundToolsRequest = MembershipRequest;

/// Parameters of `binding.bind`. An empty (or absent) `toolIds` unbinds all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindToolsRequest {
    pub agent_id: String,
    #[serde(default)]
    pub tool_ids: Vec<ToolId>,
}

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub code: i32,
    pub message: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ApiResponse {
    /// Create a success response.
    pub fn success(data: Value) -> Self {
        Self {
            code: ErrorCode::SUCCESS,
            message: "success".to_string(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn failure(code: i32, message: impl Into<String>, error: ApiError) -> Self {
        Self {
            code,
            message: message.into(),
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Unknown method.
    pub fn method_not_found(method: &str) -> Self {
        Self::failure(
            ErrorCode::NOT_FOUND,
            format!("Unknown method: {}", method),
            ApiError::default().with_suggestion(format!(
                "Use one of: {}, {}, {}",
                methods::BOUND,
                methods::UNBOUND,
                methods::BIND
            )),
        )
    }

    /// Parameters did not deserialize.
    pub fn invalid_params(err: &serde_json::Error) -> Self {
        Self::failure(
            ErrorCode::BAD_REQUEST,
            format!("Invalid params: {}", err),
            ApiError::default(),
        )
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl From<&ToolbindError> for ApiResponse {
    fn from(err: &ToolbindError) -> Self {
        match err {
            ToolbindError::Validation { message, invalid_ids } => Self::failure(
                ErrorCode::BAD_REQUEST,
                message.clone(),
                ApiError::default()
                    .with_field("toolIds")
                    .with_suggestion("List active tools before binding; only active tools can be bound")
                    .with_details(json!({ "invalidIds": invalid_ids })),
            ),
            ToolbindError::InvalidInput { field, reason } => Self::failure(
                ErrorCode::BAD_REQUEST,
                err.to_string(),
                ApiError::default()
                    .with_field(field.clone())
                    .with_details(json!({ "reason": reason })),
            ),
            ToolbindError::NotFound(_) => Self::failure(ErrorCode::NOT_FOUND, err.to_string(), ApiError::default()),
            ToolbindError::Conflict(_) => Self::failure(
                ErrorCode::CONFLICT,
                err.to_string(),
                ApiError::default().with_suggestion("Retry the request"),
            ),
            _ => Self::failure(ErrorCode::INTERNAL_ERROR, err.to_string(), ApiError::default()),
        }
    }
}

/// Error details in a failed response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Response codes.
pub struct ErrorCode;

impl ErrorCode {
    pub const SUCCESS: i32 = 0;
    /// Malformed params, out-of-range input, or invalid tool ids.
    pub const BAD_REQUEST: i32 = 400;
    /// Unknown method or record.
    pub const NOT_FOUND: i32 = 404;
    /// Concurrent write raced this one; retry.
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
}
