//! `PostgreSQL` repository implementation.
//!
//! Todos are stored as JSONB documents, one row per todo, using `sqlx` for
//! database access. Every write is a single statement, so each document update
//! is atomic and a batch insert either stores every row or none.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE todos (
//!     seq BIGSERIAL NOT NULL,
//!     id UUID PRIMARY KEY,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX idx_todos_seq ON todos(seq);
//! ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Todo, TodoId};
use crate::infrastructure::{RepositoryError, RepositoryFuture, TodoRepository};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS todos (\
     seq BIGSERIAL NOT NULL, \
     id UUID PRIMARY KEY, \
     data JSONB NOT NULL, \
     created_at TIMESTAMPTZ NOT NULL)";

const CREATE_INDEX_SQL: &str = "CREATE INDEX IF NOT EXISTS idx_todos_seq ON todos(seq)";

// =============================================================================
// Error Classification
// =============================================================================

/// Returns `true` for failures that mean the database could not be reached.
const fn is_connection_error(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Maps a failed read to a repository error.
fn read_error(error: &sqlx::Error) -> RepositoryError {
    RepositoryError::StoreUnavailable(error.to_string())
}

/// Maps a failed write to a repository error.
///
/// Connection-level failures stay `StoreUnavailable`; anything the database
/// itself rejected becomes `StoreWrite`.
fn write_error(error: &sqlx::Error) -> RepositoryError {
    if is_connection_error(error) {
        RepositoryError::StoreUnavailable(error.to_string())
    } else {
        RepositoryError::StoreWrite(error.to_string())
    }
}

fn decode_document(data: serde_json::Value) -> Result<Todo, RepositoryError> {
    serde_json::from_value(data)
        .map_err(|error| RepositoryError::SerializationError(error.to_string()))
}

fn encode_document(todo: &Todo) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(todo)
        .map_err(|error| RepositoryError::SerializationError(error.to_string()))
}

// =============================================================================
// PostgreSQL Todo Repository
// =============================================================================

/// `PostgreSQL` implementation of `TodoRepository`.
///
/// # Example
///
/// ```ignore
/// use todo_sync::infrastructure::PostgresTodoRepository;
///
/// let pool = PgPool::connect("postgres://localhost/todos").await?;
/// let repository = PostgresTodoRepository::new(pool);
/// repository.ensure_schema().await?;
///
/// let todo = Todo::new(TodoId::generate(), "Buy milk", Timestamp::now());
/// repository.insert(&todo).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTodoRepository {
    pool: PgPool,
}

impl PostgresTodoRepository {
    /// Creates a new `PostgreSQL` todo repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `todos` table and its ordering index if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StoreUnavailable` if the database cannot be
    /// reached, or `RepositoryError::StoreWrite` if the DDL is rejected.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|error| write_error(&error))?;
        sqlx::query(CREATE_INDEX_SQL)
            .execute(&self.pool)
            .await
            .map_err(|error| write_error(&error))?;
        Ok(())
    }
}

impl TodoRepository for PostgresTodoRepository {
    fn list(&self) -> RepositoryFuture<'_, Vec<Todo>> {
        Box::pin(async move {
            let rows: Vec<(serde_json::Value,)> =
                sqlx::query_as("SELECT data FROM todos ORDER BY seq ASC")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|error| read_error(&error))?;

            rows.into_iter().map(|(data,)| decode_document(data)).collect()
        })
    }

    fn insert(&self, todo: &Todo) -> RepositoryFuture<'_, ()> {
        let todo = todo.clone();
        Box::pin(async move {
            let data = encode_document(&todo)?;

            sqlx::query("INSERT INTO todos (id, data, created_at) VALUES ($1, $2, $3)")
                .bind(todo.id.as_uuid())
                .bind(&data)
                .bind(todo.created_at.as_datetime())
                .execute(&self.pool)
                .await
                .map_err(|error| write_error(&error))?;

            Ok(())
        })
    }

    fn insert_many(&self, todos: &[Todo]) -> RepositoryFuture<'_, ()> {
        let todos = todos.to_vec();
        Box::pin(async move {
            if todos.is_empty() {
                return Ok(());
            }

            tracing::debug!(todo_count = todos.len(), "Executing UNNEST bulk INSERT");

            let ids: Vec<uuid::Uuid> = todos.iter().map(|todo| *todo.id.as_uuid()).collect();
            let documents: Vec<serde_json::Value> = todos
                .iter()
                .map(encode_document)
                .collect::<Result<_, _>>()?;
            let created_at: Vec<DateTime<Utc>> = todos
                .iter()
                .map(|todo| *todo.created_at.as_datetime())
                .collect();

            // A single statement: a conflicting id aborts the whole batch
            sqlx::query(
                "INSERT INTO todos (id, data, created_at) \
                 SELECT id, data, created_at \
                 FROM UNNEST($1::uuid[], $2::jsonb[], $3::timestamptz[]) \
                     WITH ORDINALITY AS t(id, data, created_at, position) \
                 ORDER BY position",
            )
            .bind(&ids)
            .bind(&documents)
            .bind(&created_at)
            .execute(&self.pool)
            .await
            .map_err(|error| write_error(&error))?;

            Ok(())
        })
    }

    fn set_completed(&self, id: &TodoId, completed: bool) -> RepositoryFuture<'_, Option<Todo>> {
        let id = id.clone();
        Box::pin(async move {
            let row: Option<(serde_json::Value,)> = sqlx::query_as(
                "UPDATE todos SET data = jsonb_set(data, '{completed}', to_jsonb($2::boolean)) \
                 WHERE id = $1 RETURNING data",
            )
            .bind(id.as_uuid())
            .bind(completed)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| write_error(&error))?;

            row.map(|(data,)| decode_document(data)).transpose()
        })
    }

    fn delete(&self, id: &TodoId) -> RepositoryFuture<'_, bool> {
        let id = id.clone();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM todos WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|error| write_error(&error))?;

            Ok(result.rows_affected() > 0)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use rstest::rstest;

    #[rstest]
    fn test_write_error_keeps_connection_failures_unavailable() {
        let error = write_error(&sqlx::Error::PoolTimedOut);
        assert!(matches!(error, RepositoryError::StoreUnavailable(_)));
    }

    #[rstest]
    fn test_write_error_maps_rejections_to_store_write() {
        let error = write_error(&sqlx::Error::RowNotFound);
        assert!(matches!(error, RepositoryError::StoreWrite(_)));
    }

    #[rstest]
    fn test_read_error_is_unavailable() {
        let error = read_error(&sqlx::Error::PoolClosed);
        assert!(matches!(error, RepositoryError::StoreUnavailable(_)));
    }

    #[rstest]
    fn test_document_round_trip() {
        let todo = Todo::new(TodoId::generate(), "Buy milk", Timestamp::now())
            .with_description("2 litres");
        let decoded = decode_document(encode_document(&todo).unwrap()).unwrap();
        assert_eq!(decoded, todo);
    }

    #[rstest]
    fn test_decode_document_rejects_foreign_shape() {
        let result = decode_document(serde_json::json!({ "title": 42 }));
        assert!(matches!(result, Err(RepositoryError::SerializationError(_))));
    }
}
