//! HTTP handlers for the todo Resource API.
//!
//! Each handler validates its input first, touches the record store at most
//! once, and maps store failures to a 500 with an operation-level message.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::dto::{
    BulkInsertResponse, CreateTodoRequest, MessageResponse, NewTodo, TodoResponse,
    UpdateCompletionRequest, validate_bulk_records, validate_create_request,
};
use super::error::ApiErrorResponse;
use crate::domain::{Timestamp, Todo, TodoId};
use crate::infrastructure::TodoRepository;

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Uses a trait object so the backend can be chosen at runtime by
/// `RepositoryFactory`.
#[derive(Clone)]
pub struct AppState {
    /// Record store for todo documents.
    pub todo_repository: Arc<dyn TodoRepository>,
}

impl AppState {
    /// Creates a new `AppState` around the given repository.
    #[must_use]
    pub fn new(todo_repository: Arc<dyn TodoRepository>) -> Self {
        Self { todo_repository }
    }
}

// =============================================================================
// GET /api/todos
// =============================================================================

/// Lists every todo in insertion order.
///
/// # Response
///
/// - **200 OK**: Array of todos
/// - **500 Internal Server Error**: Store failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] if the store cannot be read.
pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<TodoResponse>>, ApiErrorResponse> {
    let todos = state
        .todo_repository
        .list()
        .await
        .map_err(|error| ApiErrorResponse::store_failure("Failed to fetch todos", &error))?;

    Ok(Json(todos.iter().map(TodoResponse::from).collect()))
}

// =============================================================================
// POST /api/todos
// =============================================================================

/// Creates a new todo.
///
/// # Request Body
///
/// ```json
/// {
///   "task": "Buy milk",
///   "completed": false,
///   "dueDate": "2025-01-01",
///   "description": "Optional description"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: The stored todo, including its id
/// - **400 Bad Request**: Malformed body or validation error
/// - **500 Internal Server Error**: Store failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on invalid input or store failure.
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiErrorResponse> {
    let Json(request) = payload?;
    let validated = validate_create_request(&request)?;
    let todo = build_todo(validated);

    state
        .todo_repository
        .insert(&todo)
        .await
        .map_err(|error| ApiErrorResponse::store_failure("Failed to add todo", &error))?;

    tracing::info!(todo_id = %todo.id, "Todo created");
    Ok((StatusCode::CREATED, Json(TodoResponse::from(&todo))))
}

// =============================================================================
// PATCH /api/todos/{id}
// =============================================================================

/// Sets the completion flag of a todo.
///
/// # Response
///
/// - **200 OK**: The updated todo
/// - **400 Bad Request**: Malformed id or body
/// - **404 Not Found**: No todo with that id
/// - **500 Internal Server Error**: Store failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on invalid input, missing todo or store failure.
pub async fn update_completion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCompletionRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let id = parse_todo_id(&id)?;
    let Json(request) = payload?;

    let updated = state
        .todo_repository
        .set_completed(&id, request.completed)
        .await
        .map_err(|error| ApiErrorResponse::store_failure("Failed to update todo", &error))?
        .ok_or_else(|| ApiErrorResponse::not_found(format!("Todo not found: {id}")))?;

    tracing::debug!(todo_id = %id, completed = request.completed, "Todo completion updated");
    Ok(Json(TodoResponse::from(&updated)))
}

// =============================================================================
// DELETE /api/todos/{id}
// =============================================================================

/// Deletes a todo. Deleting an unknown id still succeeds.
///
/// # Response
///
/// - **200 OK**: `{"message": "Todo deleted"}`
/// - **400 Bad Request**: Malformed id
/// - **500 Internal Server Error**: Store failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on a malformed id or store failure.
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    let id = parse_todo_id(&id)?;

    let removed = state
        .todo_repository
        .delete(&id)
        .await
        .map_err(|error| ApiErrorResponse::store_failure("Failed to delete todo", &error))?;

    tracing::debug!(todo_id = %id, removed, "Todo delete processed");
    Ok(Json(MessageResponse::new("Todo deleted")))
}

// =============================================================================
// POST /api/todos/bulk
// =============================================================================

/// Inserts a batch of loosely shaped records.
///
/// Records need no label. Every record is type-checked before the store is
/// touched; the insert itself is all-or-nothing.
///
/// # Request Body
///
/// ```json
/// [
///   { "title": "Store A", "month": "06-2024", "description": "Total Revenue: 230.00" },
///   { "task": "Store B" }
/// ]
/// ```
///
/// # Response
///
/// - **201 Created**: `{"message": "Todos inserted successfully", "inserted": 2}`
/// - **400 Bad Request**: Body is not an array, or an item has a value of the wrong type
/// - **500 Internal Server Error**: Store failure
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on invalid input or store failure.
pub async fn bulk_insert(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BulkInsertResponse>), ApiErrorResponse> {
    let Json(body) = payload?;
    let validated = validate_bulk_records(body)?;
    let todos = build_todos(validated);

    state
        .todo_repository
        .insert_many(&todos)
        .await
        .map_err(|error| {
            ApiErrorResponse::store_failure("Failed to insert store todos", &error)
        })?;

    tracing::info!(count = todos.len(), "Todos bulk inserted");
    Ok((
        StatusCode::CREATED,
        Json(BulkInsertResponse {
            message: "Todos inserted successfully".to_string(),
            inserted: todos.len(),
        }),
    ))
}

// =============================================================================
// GET /health
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Health check endpoint.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0" }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parses a path segment into a `TodoId`.
///
/// # Errors
///
/// Returns a 400 `INVALID_IDENTIFIER` response for malformed ids.
pub fn parse_todo_id(raw: &str) -> Result<TodoId, ApiErrorResponse> {
    raw.parse()
        .map_err(|error| ApiErrorResponse::invalid_identifier(&error))
}

/// Assigns identity and creation time to a validated todo.
///
/// Note: impure (UUID generation, system clock).
fn build_todo(validated: NewTodo) -> Todo {
    validated.into_todo(TodoId::generate(), Timestamp::now())
}

/// Assigns identities to a batch; the whole batch shares one creation time.
fn build_todos(validated: Vec<NewTodo>) -> Vec<Todo> {
    let now = Timestamp::now();
    validated
        .into_iter()
        .map(|todo| todo.into_todo(TodoId::generate(), now))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
