//! API error handling.
//!
//! This module provides error types and response formatting for the API.
//! Every error body carries at least `code` and `message`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::InvalidTodoId;
use crate::infrastructure::RepositoryError;

// =============================================================================
// API Error
// =============================================================================

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional field-level errors for validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    /// Creates a new API error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a validation error with field-level details.
    #[must_use]
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self {
            code: "VALIDATION_ERROR".to_string(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// Field-level error for validation failures.
///
/// Bulk requests prefix the field with the item index, e.g. `[2].title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field that failed validation.
    pub field: String,
    /// Error message for this field.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the same error with its field scoped to a bulk item index.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self {
            field: format!("[{index}].{}", self.field),
            message: self.message,
        }
    }
}

// =============================================================================
// API Error Response
// =============================================================================

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Error details.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a new API error response.
    #[must_use]
    pub const fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// Creates a 400 Bad Request response.
    #[must_use]
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new(code, message))
    }

    /// Creates a 400 Bad Request response for validation errors.
    #[must_use]
    pub fn validation_error(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiError::validation(message, details),
        )
    }

    /// Creates a 400 Bad Request response for a malformed todo id.
    #[must_use]
    pub fn invalid_identifier(error: &InvalidTodoId) -> Self {
        Self::bad_request("INVALID_IDENTIFIER", error.to_string())
    }

    /// Creates a 404 Not Found response.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }

    /// Creates a 500 response for a failed store operation.
    ///
    /// The underlying cause is logged, never exposed; `context` is the
    /// operation-level message returned to the caller.
    #[must_use]
    pub fn store_failure(context: &str, error: &RepositoryError) -> Self {
        tracing::error!(%error, context, "Record store operation failed");
        let code = match error {
            RepositoryError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            RepositoryError::StoreWrite(_) => "STORE_WRITE_ERROR",
            RepositoryError::SerializationError(_) => "INTERNAL_ERROR",
        };
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiError::new(code, context))
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("INVALID_BODY", rejection.body_text())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Validation error type for request validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field-level errors.
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Creates a validation error with a single field error.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }
}

impl From<ValidationError> for ApiErrorResponse {
    fn from(error: ValidationError) -> Self {
        Self::validation_error("Validation failed", error.errors)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_api_error_new() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.details.is_none());
    }

    #[rstest]
    fn test_api_error_validation() {
        let details = vec![FieldError::new("title", "Title is required")];
        let error = ApiError::validation("Validation failed", details.clone());
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert_eq!(error.details, Some(details));
    }

    #[rstest]
    fn test_field_error_at_index() {
        let error = FieldError::new("title", "Title is required").at_index(3);
        assert_eq!(error.field, "[3].title");
        assert_eq!(error.message, "Title is required");
    }

    #[rstest]
    fn test_api_error_body_omits_empty_details() {
        let body = serde_json::to_value(ApiError::new("NOT_FOUND", "Todo not found")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "code": "NOT_FOUND", "message": "Todo not found" })
        );
    }

    #[rstest]
    fn test_invalid_identifier_is_bad_request() {
        let response = ApiErrorResponse::invalid_identifier(&InvalidTodoId("abc".to_string()));
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "INVALID_IDENTIFIER");
        assert_eq!(response.error.message, "Invalid todo identifier: abc");
    }

    #[rstest]
    fn test_api_error_response_not_found() {
        let response = ApiErrorResponse::not_found("Todo not found");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.error.code, "NOT_FOUND");
    }

    #[rstest]
    #[case(RepositoryError::StoreUnavailable("refused".to_string()), "STORE_UNAVAILABLE")]
    #[case(RepositoryError::StoreWrite("duplicate key".to_string()), "STORE_WRITE_ERROR")]
    #[case(RepositoryError::SerializationError("bad".to_string()), "INTERNAL_ERROR")]
    fn test_store_failure_hides_cause(#[case] error: RepositoryError, #[case] code: &str) {
        let response = ApiErrorResponse::store_failure("Failed to fetch todos", &error);
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error.code, code);
        assert_eq!(response.error.message, "Failed to fetch todos");
    }

    #[rstest]
    fn test_validation_error_to_api_error_response() {
        let error = ValidationError::single("title", "Title is required");
        assert_eq!(error.errors.len(), 1);
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
    }
}
