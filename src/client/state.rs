//! Client state cache.
//!
//! [`ClientState`] is a plain value. The store actor folds [`Message`]s into
//! it with [`ClientState::apply`], which never performs I/O.

use crate::domain::{Timestamp, Todo, TodoId};

use super::view::{FilterMode, apply_filter, format_display_date};

// =============================================================================
// Todo Entry
// =============================================================================

/// A cached todo plus its display-only labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoEntry {
    /// The record as last returned by the server.
    pub todo: Todo,
    /// Formatted creation date.
    pub created_label: String,
    /// Formatted due date, or `Not set`.
    pub due_label: String,
}

impl TodoEntry {
    /// Wraps a todo and computes its display labels.
    #[must_use]
    pub fn new(todo: Todo) -> Self {
        Self {
            created_label: format_display_date(Some(todo.created_at)),
            due_label: format_display_date(todo.due_date),
            todo,
        }
    }

    /// Returns `true` if the entry should be shown as overdue at `now`.
    #[must_use]
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.todo.is_overdue(now)
    }
}

impl AsRef<Todo> for TodoEntry {
    fn as_ref(&self) -> &Todo {
        &self.todo
    }
}

// =============================================================================
// Messages
// =============================================================================

/// State transitions produced by store commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A list fetch began; the error slot is cleared.
    RefreshStarted,
    /// The full list arrived and replaces the cached sequence.
    Loaded(Vec<Todo>),
    /// A created todo is appended.
    Added(Todo),
    /// A server-returned todo replaces the entry with the same id.
    Replaced(Todo),
    /// The server acknowledged a delete.
    Removed(TodoId),
    /// The view filter changed.
    FilterChanged(FilterMode),
    /// A round trip failed; the message goes into the error slot.
    Failed(String),
}

// =============================================================================
// Client State
// =============================================================================

/// Snapshot of the client-side cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    /// Cached todos in server order.
    pub entries: Vec<TodoEntry>,
    /// `true` while the full list is being fetched.
    pub loading: bool,
    /// Last failure, cleared by the next success.
    pub error: Option<String>,
    /// Current view filter.
    pub filter: FilterMode,
}

impl ClientState {
    /// Folds a message into the state (pure function).
    #[must_use]
    pub fn apply(self, message: Message) -> Self {
        match message {
            Message::RefreshStarted => Self {
                loading: true,
                error: None,
                ..self
            },
            Message::Loaded(todos) => Self {
                entries: todos.into_iter().map(TodoEntry::new).collect(),
                ..self.succeeded()
            },
            Message::Added(todo) => {
                let mut state = self.succeeded();
                state.entries.push(TodoEntry::new(todo));
                state
            }
            Message::Replaced(todo) => {
                let mut state = self.succeeded();
                if let Some(entry) = state.entries.iter_mut().find(|entry| entry.todo.id == todo.id)
                {
                    *entry = TodoEntry::new(todo);
                }
                state
            }
            Message::Removed(id) => {
                let mut state = self.succeeded();
                state.entries.retain(|entry| entry.todo.id != id);
                state
            }
            Message::FilterChanged(filter) => Self { filter, ..self },
            Message::Failed(error) => Self {
                loading: false,
                error: Some(error),
                ..self
            },
        }
    }

    fn succeeded(self) -> Self {
        Self {
            loading: false,
            error: None,
            ..self
        }
    }

    /// Returns the entries visible under the current filter.
    #[must_use]
    pub fn visible(&self) -> Vec<&TodoEntry> {
        apply_filter(&self.entries, self.filter)
    }

    /// Finds the cached entry for `id`.
    #[must_use]
    pub fn find(&self, id: &TodoId) -> Option<&TodoEntry> {
        self.entries.iter().find(|entry| &entry.todo.id == id)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn todo(title: &str) -> Todo {
        Todo::new(
            TodoId::generate(),
            title,
            Timestamp::parse_flexible("2024-06-01").unwrap(),
        )
    }

    fn loaded(todos: &[Todo]) -> ClientState {
        ClientState::default().apply(Message::Loaded(todos.to_vec()))
    }

    #[rstest]
    fn test_entry_labels() {
        let entry = TodoEntry::new(
            todo("Pay rent").with_due_date(Some(Timestamp::parse_flexible("2025-01-01").unwrap())),
        );
        assert_eq!(entry.created_label, "Jun 1, 2024");
        assert_eq!(entry.due_label, "Jan 1, 2025");

        let entry = TodoEntry::new(todo("Someday"));
        assert_eq!(entry.due_label, "Not set");
    }

    #[rstest]
    fn test_refresh_started_clears_error_and_sets_loading() {
        let state = ClientState::default()
            .apply(Message::Failed("boom".to_string()))
            .apply(Message::RefreshStarted);

        assert!(state.loading);
        assert!(state.error.is_none());
    }

    #[rstest]
    fn test_mutations_never_raise_loading() {
        let first = todo("First");
        let state = loaded(&[first.clone()]);

        for message in [
            Message::Added(todo("Second")),
            Message::Replaced(first.clone().with_completed(true)),
            Message::Removed(first.id.clone()),
            Message::Failed("Failed to add todo".to_string()),
        ] {
            assert!(!state.clone().apply(message).loading);
        }
    }

    #[rstest]
    fn test_loaded_replaces_entries() {
        let state = loaded(&[todo("Old")]).apply(Message::Loaded(vec![todo("New")]));

        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].todo.title, "New");
        assert!(!state.loading);
    }

    #[rstest]
    fn test_added_appends() {
        let first = todo("First");
        let second = todo("Second");

        let state = loaded(&[first]).apply(Message::Added(second.clone()));

        assert_eq!(state.entries.last().map(|entry| &entry.todo), Some(&second));
    }

    #[rstest]
    fn test_replaced_swaps_matching_entry_in_place() {
        let first = todo("First");
        let second = todo("Second");
        let state = loaded(&[first.clone(), second.clone()]);

        let state = state.apply(Message::Replaced(first.clone().with_completed(true)));

        assert!(state.entries[0].todo.completed);
        assert_eq!(state.entries[1].todo, second);
    }

    #[rstest]
    fn test_replaced_unknown_id_is_ignored() {
        let first = todo("First");
        let state = loaded(&[first.clone()]).apply(Message::Replaced(todo("Stranger")));
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].todo, first);
    }

    #[rstest]
    fn test_removed_drops_entry() {
        let first = todo("First");
        let second = todo("Second");

        let state = loaded(&[first.clone(), second]).apply(Message::Removed(first.id.clone()));

        assert!(state.find(&first.id).is_none());
        assert_eq!(state.entries.len(), 1);
    }

    #[rstest]
    fn test_failed_keeps_entries() {
        let first = todo("First");
        let state = loaded(&[first.clone()]).apply(Message::Failed("Failed to add todo".to_string()));

        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.entries[0].todo, first);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Failed to add todo"));
    }

    #[rstest]
    fn test_success_clears_error() {
        let state = ClientState::default()
            .apply(Message::Failed("boom".to_string()))
            .apply(Message::Added(todo("Fine")));
        assert!(state.error.is_none());
    }

    #[rstest]
    fn test_filter_changes_view_not_entries() {
        let done = todo("Done").with_completed(true);
        let open = todo("Open");
        let state = loaded(&[done.clone(), open]).apply(Message::FilterChanged(FilterMode::Completed));

        let visible: Vec<&Todo> = state.visible().into_iter().map(|entry| &entry.todo).collect();

        assert_eq!(visible, vec![&done]);
        assert_eq!(state.entries.len(), 2);
    }
}
