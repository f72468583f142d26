//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use dto::{
    BulkInsertResponse, CreateTodoRequest, MessageResponse, TodoResponse, UpdateCompletionRequest,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use handlers::{
    AppState, HealthResponse, bulk_insert, create_todo, delete_todo, health_check, list_todos,
    update_completion,
};
pub use routes::create_router;
