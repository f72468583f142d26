//! Repository trait for the todo record store.
//!
//! Every operation returns a boxed future so the trait stays object safe and
//! backends can be selected at runtime behind `Arc<dyn TodoRepository>`.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{Todo, TodoId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The store could not be reached (connection, pool or I/O failure).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected a write.
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Future returned by every repository operation.
pub type RepositoryFuture<'a, T> = BoxFuture<'a, Result<T, RepositoryError>>;

// =============================================================================
// Todo Repository
// =============================================================================

/// Repository trait for `Todo` documents.
///
/// Implementations own identity and ordering: `list` returns documents in
/// insertion order, and a given id is stored at most once.
pub trait TodoRepository: Send + Sync {
    /// Lists every todo in store-native (insertion) order.
    fn list(&self) -> RepositoryFuture<'_, Vec<Todo>>;

    /// Inserts a new todo.
    ///
    /// Fails with `StoreWrite` if a document with the same id already exists.
    fn insert(&self, todo: &Todo) -> RepositoryFuture<'_, ()>;

    /// Inserts a batch of todos atomically.
    ///
    /// Either every todo is stored or none is.
    fn insert_many(&self, todos: &[Todo]) -> RepositoryFuture<'_, ()>;

    /// Sets the completed flag of a single document.
    ///
    /// Returns the updated todo, or `Ok(None)` if the id does not exist.
    fn set_completed(&self, id: &TodoId, completed: bool) -> RepositoryFuture<'_, Option<Todo>>;

    /// Deletes a todo by its ID.
    ///
    /// Returns `Ok(true)` if the todo was deleted, `Ok(false)` if it didn't exist.
    fn delete(&self, id: &TodoId) -> RepositoryFuture<'_, bool>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_repository_error_display() {
        let error = RepositoryError::StoreUnavailable("connection refused".to_string());
        assert_eq!(format!("{error}"), "Store unavailable: connection refused");

        let error = RepositoryError::StoreWrite("duplicate key".to_string());
        assert_eq!(format!("{error}"), "Store write error: duplicate key");

        let error = RepositoryError::SerializationError("missing field".to_string());
        assert_eq!(format!("{error}"), "Serialization error: missing field");
    }
}
