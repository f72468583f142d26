//! Data Transfer Objects for API requests and responses.
//!
//! This module contains DTOs that are separate from the domain model,
//! providing a clean API contract, plus the pure validation functions that
//! turn requests into new todos.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use crate::domain::{Timestamp, Todo, TodoId};

const TITLE_MAX_LENGTH: usize = 200;
const DESCRIPTION_MAX_LENGTH: usize = 5000;

// =============================================================================
// Request DTOs
// =============================================================================

/// Request DTO for creating a new todo.
///
/// The label arrives as `task` or `title`; `task` wins when both are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    /// Label of the todo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Alternative label field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Initial completion flag (defaults to false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Optional due date, RFC 3339 or `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request DTO for updating the completion flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateCompletionRequest {
    /// New completion flag.
    pub completed: bool,
}

/// One record of a bulk insert.
///
/// The shape is loose: the label may be `title`, `task` or absent, and
/// unknown fields are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRecord {
    /// Label of the todo.
    #[serde(default)]
    pub title: Option<String>,
    /// Alternative label field.
    #[serde(default)]
    pub task: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Initial completion flag.
    #[serde(default)]
    pub completed: Option<bool>,
    /// Optional due date.
    #[serde(default)]
    pub due_date: Option<String>,
}

// =============================================================================
// Response DTOs
// =============================================================================

/// Response DTO for a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    /// Todo ID.
    pub id: String,
    /// Label of the todo.
    pub title: String,
    /// Description of the todo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Due date (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl From<&Todo> for TodoResponse {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.to_string(),
            title: todo.title.clone(),
            description: todo.description.clone(),
            completed: todo.completed,
            created_at: todo.created_at.to_rfc3339(),
            due_date: todo.due_date.map(|due| due.to_rfc3339()),
        }
    }
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self::from(&todo)
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a new message response.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body of a bulk insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkInsertResponse {
    /// Human-readable message.
    pub message: String,
    /// Number of stored todos.
    pub inserted: usize,
}

// =============================================================================
// Validated Input
// =============================================================================

/// A validated todo that has not been assigned an identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    /// Trimmed title.
    pub title: String,
    /// Trimmed, non-empty description.
    pub description: Option<String>,
    /// Initial completion flag.
    pub completed: bool,
    /// Normalized due date.
    pub due_date: Option<Timestamp>,
}

impl NewTodo {
    fn from_fields(
        title: String,
        description: Option<String>,
        completed: Option<bool>,
        due_date: Option<Timestamp>,
    ) -> Self {
        Self {
            title,
            description,
            completed: completed.unwrap_or(false),
            due_date,
        }
    }

    /// Builds the stored todo from validated input (pure function).
    #[must_use]
    pub fn into_todo(self, id: TodoId, created_at: Timestamp) -> Todo {
        let todo = Todo::new(id, self.title, created_at)
            .with_completed(self.completed)
            .with_due_date(self.due_date);
        match self.description {
            Some(description) => todo.with_description(description),
            None => todo,
        }
    }
}

// =============================================================================
// Validation Functions
// =============================================================================

/// Validates a todo title.
///
/// # Errors
///
/// Returns `ValidationError` if the title is empty or longer than 200 characters.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(ValidationError::single("title", "Title cannot be empty"))
    } else if trimmed.chars().count() > TITLE_MAX_LENGTH {
        Err(ValidationError::single(
            "title",
            format!("Title cannot exceed {TITLE_MAX_LENGTH} characters"),
        ))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Validates a todo description. Blank descriptions become `None`.
///
/// # Errors
///
/// Returns `ValidationError` if the description exceeds 5000 characters.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    match description.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > DESCRIPTION_MAX_LENGTH => {
            Err(ValidationError::single(
                "description",
                format!("Description cannot exceed {DESCRIPTION_MAX_LENGTH} characters"),
            ))
        }
        Some(text) => Ok(Some(text.to_string())),
    }
}

/// Validates a due date. Blank values become `None`.
///
/// # Errors
///
/// Returns `ValidationError` if the value is neither RFC 3339 nor `YYYY-MM-DD`.
pub fn validate_due_date(due_date: Option<&str>) -> Result<Option<Timestamp>, ValidationError> {
    match due_date.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Timestamp::parse_flexible(text).map(Some).map_err(|_| {
            ValidationError::single(
                "dueDate",
                "Due date must be an RFC 3339 timestamp or a YYYY-MM-DD date",
            )
        }),
    }
}

/// Collects every field error of a todo input instead of stopping at the first.
fn validate_fields(
    title: Option<&str>,
    description: Option<&str>,
    due_date: Option<&str>,
    completed: Option<bool>,
) -> Result<NewTodo, ValidationError> {
    let title = title.map_or_else(
        || Err(ValidationError::single("title", "Title is required")),
        validate_title,
    );
    let description = validate_description(description);
    let due_date = validate_due_date(due_date);

    match (title, description, due_date) {
        (Ok(title), Ok(description), Ok(due_date)) => Ok(NewTodo::from_fields(
            title,
            description,
            completed,
            due_date,
        )),
        (title, description, due_date) => {
            let errors = [title.err(), description.err(), due_date.err()]
                .into_iter()
                .flatten()
                .flat_map(|error| error.errors)
                .collect();
            Err(ValidationError::new(errors))
        }
    }
}

/// Validates a create request.
///
/// # Errors
///
/// Returns `ValidationError` listing every invalid field.
pub fn validate_create_request(request: &CreateTodoRequest) -> Result<NewTodo, ValidationError> {
    validate_fields(
        request.task.as_deref().or(request.title.as_deref()),
        request.description.as_deref(),
        request.due_date.as_deref(),
        request.completed,
    )
}

/// Validates a bulk insert body.
///
/// The body must be a JSON array of objects. Records are taken as they come:
/// a missing label becomes an empty title and no length limits apply. Only
/// values of the wrong type and unparsable due dates are rejected. Every item
/// is checked before anything is returned, and field errors are reported as
/// `[index].field`.
///
/// # Errors
///
/// Returns `ValidationError` if the body is not an array or any item is invalid.
pub fn validate_bulk_records(body: serde_json::Value) -> Result<Vec<NewTodo>, ValidationError> {
    let serde_json::Value::Array(items) = body else {
        return Err(ValidationError::single(
            "body",
            "Request body must be an array of todo records",
        ));
    };

    let mut validated = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match validate_bulk_item(item) {
            Ok(todo) => validated.push(todo),
            Err(error) => errors.extend(
                error
                    .errors
                    .into_iter()
                    .map(|field_error| field_error.at_index(index)),
            ),
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(ValidationError::new(errors))
    }
}

fn validate_bulk_item(item: serde_json::Value) -> Result<NewTodo, ValidationError> {
    if !item.is_object() {
        return Err(ValidationError::single("record", "Record must be an object"));
    }

    let record: BulkRecord = serde_json::from_value(item)
        .map_err(|error| ValidationError::single("record", error.to_string()))?;

    let title = record
        .title
        .or(record.task)
        .map(|title| title.trim().to_string())
        .unwrap_or_default();
    let description = record
        .description
        .map(|description| description.trim().to_string())
        .filter(|description| !description.is_empty());
    let due_date = validate_due_date(record.due_date.as_deref())?;

    Ok(NewTodo::from_fields(
        title,
        description,
        record.completed,
        due_date,
    ))
}

// =============================================================================
// Tests
// =============================================================================
