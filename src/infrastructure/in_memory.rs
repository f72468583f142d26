//! In-memory repository implementation.
//!
//! Documents are kept in insertion order behind an `Arc<RwLock<...>>`, which
//! makes every single-document write atomic and lets a batch insert validate
//! the whole batch before committing any of it.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{Todo, TodoId};
use crate::infrastructure::{RepositoryError, RepositoryFuture, TodoRepository};

/// Returns the first id that appears twice in `todos`, or that is already stored.
fn find_conflicting_id<'a>(stored: &[Todo], todos: &'a [Todo]) -> Option<&'a TodoId> {
    let mut seen: HashSet<&TodoId> = stored.iter().map(|todo| &todo.id).collect();
    todos
        .iter()
        .map(|todo| &todo.id)
        .find(|id| !seen.insert(id))
}

// =============================================================================
// In-Memory Todo Repository
// =============================================================================

/// In-memory implementation of `TodoRepository`.
///
/// # Example
///
/// ```ignore
/// use todo_sync::infrastructure::InMemoryTodoRepository;
///
/// let repository = InMemoryTodoRepository::new();
/// let todo = Todo::new(TodoId::generate(), "Buy milk", Timestamp::now());
///
/// repository.insert(&todo).await?;
/// let todos = repository.list().await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoRepository {
    todos: Arc<RwLock<Vec<Todo>>>,
}

impl InMemoryTodoRepository {
    /// Creates a new empty in-memory todo repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with the given todos.
    #[must_use]
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: Arc::new(RwLock::new(todos)),
        }
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TodoRepository for InMemoryTodoRepository {
    fn list(&self) -> RepositoryFuture<'_, Vec<Todo>> {
        Box::pin(async move {
            let guard = self.todos.read().await;
            Ok(guard.clone())
        })
    }

    fn insert(&self, todo: &Todo) -> RepositoryFuture<'_, ()> {
        let todo = todo.clone();
        Box::pin(async move {
            let mut guard = self.todos.write().await;
            if guard.iter().any(|existing| existing.id == todo.id) {
                return Err(RepositoryError::StoreWrite(format!(
                    "Duplicate id: {}",
                    todo.id
                )));
            }
            guard.push(todo);
            Ok(())
        })
    }

    fn insert_many(&self, todos: &[Todo]) -> RepositoryFuture<'_, ()> {
        let todos = todos.to_vec();
        Box::pin(async move {
            let mut guard = self.todos.write().await;

            // Validate the whole batch first so a conflict leaves the store untouched
            if let Some(id) = find_conflicting_id(&guard, &todos) {
                return Err(RepositoryError::StoreWrite(format!("Duplicate id: {id}")));
            }

            guard.extend(todos);
            Ok(())
        })
    }

    fn set_completed(&self, id: &TodoId, completed: bool) -> RepositoryFuture<'_, Option<Todo>> {
        let id = id.clone();
        Box::pin(async move {
            let mut guard = self.todos.write().await;
            Ok(guard.iter_mut().find(|todo| todo.id == id).map(|todo| {
                todo.completed = completed;
                todo.clone()
            }))
        })
    }

    fn delete(&self, id: &TodoId) -> RepositoryFuture<'_, bool> {
        let id = id.clone();
        Box::pin(async move {
            let mut guard = self.todos.write().await;
            let before = guard.len();
            guard.retain(|todo| todo.id != id);
            Ok(guard.len() != before)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
