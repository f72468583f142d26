//! Todo domain model.
//!
//! This module contains the core domain model for the todo list: the
//! identifier and timestamp value objects and the `Todo` entity itself.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a todo.
///
/// This is a newtype wrapper around UUID to provide type safety. Identifiers
/// are assigned by the record store and never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new `TodoId` with a time-ordered UUID (v7).
    ///
    /// **Note**: This is an impure function (side effect: time + random).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Error returned when a string is not a well-formed todo identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid todo identifier: {0}")]
pub struct InvalidTodoId(pub String);

impl FromStr for TodoId {
    type Err = InvalidTodoId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| InvalidTodoId(value.to_string()))
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
///
/// Serialized as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    ///
    /// **Note**: This is an impure function (side effect: system clock).
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parses a user supplied date.
    ///
    /// Accepts either a full RFC 3339 timestamp or a plain calendar date
    /// (`YYYY-MM-DD`), which is normalized to midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampParseError`] if the input matches neither format.
    pub fn parse_flexible(value: &str) -> Result<Self, TimestampParseError> {
        let value = value.trim();

        if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self(datetime.with_timezone(&Utc)));
        }

        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| TimestampParseError(value.to_string()))
    }

    /// Returns the timestamp as an RFC 3339 string in UTC (`Z` suffix).
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

/// Error returned when a date string cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date: {0}")]
pub struct TimestampParseError(pub String);

// =============================================================================
// Todo
// =============================================================================

/// The todo entity.
///
/// `completed` is the only field that changes after creation; everything else
/// is fixed when the record store first persists the todo.
///
/// The serialized form doubles as the stored document shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier assigned by the record store.
    pub id: TodoId,
    /// Human readable label.
    pub title: String,
    /// Optional free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Creation time, set once.
    pub created_at: Timestamp,
    /// Optional due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
}

impl Todo {
    /// Creates a new, not yet completed todo.
    ///
    /// This is a pure function. Use `TodoId::generate()` and `Timestamp::now()`
    /// at the call site to obtain the identity and creation time.
    #[must_use]
    pub fn new(id: TodoId, title: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            completed: false,
            created_at,
            due_date: None,
        }
    }

    /// Returns a new todo with the given description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    /// Returns a new todo with the given due date.
    #[must_use]
    pub fn with_due_date(self, due_date: Option<Timestamp>) -> Self {
        Self { due_date, ..self }
    }

    /// Returns a new todo with the completed flag set to the given value.
    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }

    /// Returns a new todo with the completed flag inverted.
    #[must_use]
    pub fn toggled(self) -> Self {
        let completed = !self.completed;
        self.with_completed(completed)
    }

    /// Returns `true` if the todo is still open and its due date lies before `now`.
    #[must_use]
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

impl AsRef<Self> for Todo {
    fn as_ref(&self) -> &Self {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn test_todo(title: &str) -> Todo {
        Todo::new(TodoId::generate(), title, Timestamp::now())
    }

    fn at(year: i32, month: u32, day: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap())
    }

    // -------------------------------------------------------------------------
    // TodoId Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_todo_id_generate_creates_unique_ids() {
        let id1 = TodoId::generate();
        let id2 = TodoId::generate();
        assert_ne!(id1, id2);
    }

    #[rstest]
    fn test_todo_id_parse_round_trips_display() {
        let id = TodoId::generate();
        let parsed: TodoId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case("65a1f0c2e4b0a1b2c3d4e5f6")]
    #[case("550e8400-e29b-41d4-a716-44665544000")]
    fn test_todo_id_parse_rejects_malformed(#[case] input: &str) {
        let result: Result<TodoId, _> = input.parse();
        assert_eq!(result, Err(InvalidTodoId(input.to_string())));
    }

    // -------------------------------------------------------------------------
    // Timestamp Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_parse_flexible_accepts_calendar_date() {
        let parsed = Timestamp::parse_flexible("2025-01-01").unwrap();
        assert_eq!(parsed, at(2025, 1, 1));
        assert_eq!(parsed.to_rfc3339(), "2025-01-01T00:00:00Z");
    }

    #[rstest]
    fn test_parse_flexible_accepts_rfc3339_with_offset() {
        let parsed = Timestamp::parse_flexible("2025-01-01T09:00:00+09:00").unwrap();
        assert_eq!(parsed, at(2025, 1, 1));
    }

    #[rstest]
    #[case("tomorrow")]
    #[case("2025-13-01")]
    #[case("01/01/2025")]
    fn test_parse_flexible_rejects_garbage(#[case] input: &str) {
        assert!(Timestamp::parse_flexible(input).is_err());
    }

    // -------------------------------------------------------------------------
    // Todo Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_todo_new_is_not_completed() {
        let todo = test_todo("Buy milk");
        assert_eq!(todo.title, "Buy milk");
        assert!(!todo.completed);
        assert!(todo.description.is_none());
        assert!(todo.due_date.is_none());
    }

    #[rstest]
    fn test_toggled_is_an_involution() {
        let todo = test_todo("Buy milk");
        let twice = todo.clone().toggled().toggled();
        assert_eq!(twice, todo);
    }

    #[rstest]
    fn test_with_completed_keeps_other_fields() {
        let todo = test_todo("Buy milk")
            .with_description("2 litres")
            .with_due_date(Some(at(2025, 1, 1)));
        let updated = todo.clone().with_completed(true);

        assert!(updated.completed);
        assert_eq!(updated.id, todo.id);
        assert_eq!(updated.title, todo.title);
        assert_eq!(updated.description, todo.description);
        assert_eq!(updated.created_at, todo.created_at);
        assert_eq!(updated.due_date, todo.due_date);
    }

    #[rstest]
    #[case(false, Some((2025, 1, 1)), true)]
    #[case(true, Some((2025, 1, 1)), false)]
    #[case(false, Some((2025, 3, 1)), false)]
    #[case(false, None, false)]
    fn test_is_overdue(
        #[case] completed: bool,
        #[case] due: Option<(i32, u32, u32)>,
        #[case] expected: bool,
    ) {
        let todo = test_todo("Pay rent")
            .with_completed(completed)
            .with_due_date(due.map(|(year, month, day)| at(year, month, day)));
        assert_eq!(todo.is_overdue(at(2025, 2, 1)), expected);
    }

    // -------------------------------------------------------------------------
    // Serialization Tests
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_todo_document_uses_camel_case() {
        let todo = test_todo("Buy milk").with_due_date(Some(at(2025, 1, 1)));
        let document = serde_json::to_value(&todo).unwrap();

        assert_eq!(document["title"], "Buy milk");
        assert_eq!(document["completed"], false);
        assert!(document.get("createdAt").is_some());
        assert_eq!(document["dueDate"], "2025-01-01T00:00:00Z");
        assert!(document.get("description").is_none());
    }

    // -------------------------------------------------------------------------
    // Property Tests
    // -------------------------------------------------------------------------

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn toggling_twice_restores_the_todo(
                title in "[a-zA-Z ]{1,40}",
                completed in any::<bool>(),
                due_day in proptest::option::of(1u32..=28),
            ) {
                let todo = test_todo(&title)
                    .with_completed(completed)
                    .with_due_date(due_day.map(|day| at(2025, 1, day)));

                let once = todo.clone().toggled();
                prop_assert_eq!(once.completed, !completed);
                prop_assert_eq!(once.toggled(), todo);
            }
        }
    }
}
