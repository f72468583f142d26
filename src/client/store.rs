//! Client store actor.
//!
//! A single task owns the [`ClientState`]. Commands arrive over an `mpsc`
//! channel and run one at a time, so two toggles on the same id serialize and
//! the second one reads the value written by the first. Every intermediate
//! state is published on a `watch` channel. Only a list fetch raises the
//! `loading` flag; mutations leave it untouched while they wait for the server.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::api::{ClientError, TodoApi};
use super::state::{ClientState, Message};
use super::view::FilterMode;
use crate::domain::TodoId;

const COMMAND_QUEUE_CAPACITY: usize = 32;

type Reply = oneshot::Sender<ClientState>;

enum Command {
    Refresh {
        reply: Reply,
    },
    Add {
        title: String,
        due_date: Option<String>,
        reply: Reply,
    },
    Toggle {
        id: TodoId,
        reply: Reply,
    },
    Remove {
        id: TodoId,
        reply: Reply,
    },
    SetFilter {
        mode: FilterMode,
        reply: Reply,
    },
    Import {
        records: Vec<serde_json::Value>,
        reply: Reply,
    },
}

// =============================================================================
// Actor
// =============================================================================

/// The actor that owns the client state.
pub struct TodoStore {
    api: Arc<dyn TodoApi>,
    state: ClientState,
    snapshots: watch::Sender<ClientState>,
    commands: mpsc::Receiver<Command>,
}

impl TodoStore {
    /// Spawns the actor on the current tokio runtime and returns its handle.
    ///
    /// The actor stops once every handle has been dropped.
    #[must_use]
    pub fn spawn(api: Arc<dyn TodoApi>) -> (TodoStoreHandle, JoinHandle<()>) {
        let (command_sender, command_receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (snapshot_sender, snapshot_receiver) = watch::channel(ClientState::default());

        let store = Self {
            api,
            state: ClientState::default(),
            snapshots: snapshot_sender,
            commands: command_receiver,
        };
        let task = tokio::spawn(store.run());

        let handle = TodoStoreHandle {
            commands: command_sender,
            snapshots: snapshot_receiver,
        };
        (handle, task)
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.handle(command).await;
        }
        tracing::debug!("Todo store stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Refresh { reply } => {
                self.refresh().await;
                self.reply(reply);
            }
            Command::Add {
                title,
                due_date,
                reply,
            } => {
                self.add(&title, due_date.as_deref()).await;
                self.reply(reply);
            }
            Command::Toggle { id, reply } => {
                self.toggle(&id).await;
                self.reply(reply);
            }
            Command::Remove { id, reply } => {
                self.remove(&id).await;
                self.reply(reply);
            }
            Command::SetFilter { mode, reply } => {
                self.publish(Message::FilterChanged(mode));
                self.reply(reply);
            }
            Command::Import { records, reply } => {
                self.import(&records).await;
                self.reply(reply);
            }
        }
    }

    async fn refresh(&mut self) {
        tracing::debug!("Refreshing todos");
        self.publish(Message::RefreshStarted);
        let message = match self.api.list().await {
            Ok(todos) => Message::Loaded(todos),
            Err(error) => failure("Failed to fetch todos", &error),
        };
        self.publish(message);
    }

    async fn add(&mut self, title: &str, due_date: Option<&str>) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }

        tracing::debug!(title, "Adding todo");
        let message = match self.api.create(title, due_date).await {
            Ok(todo) => Message::Added(todo),
            Err(error) => failure("Failed to add todo", &error),
        };
        self.publish(message);
    }

    async fn toggle(&mut self, id: &TodoId) {
        let Some(entry) = self.state.find(id) else {
            tracing::debug!(todo_id = %id, "Toggle ignored for unknown todo");
            return;
        };
        let completed = !entry.todo.completed;

        tracing::debug!(todo_id = %id, completed, "Toggling todo");
        let message = match self.api.set_completed(id, completed).await {
            Ok(todo) => Message::Replaced(todo),
            Err(error) => failure("Failed to update todo", &error),
        };
        self.publish(message);
    }

    async fn remove(&mut self, id: &TodoId) {
        tracing::debug!(todo_id = %id, "Removing todo");
        let message = match self.api.delete(id).await {
            Ok(()) => Message::Removed(id.clone()),
            Err(error) => failure("Failed to delete todo", &error),
        };
        self.publish(message);
    }

    async fn import(&mut self, records: &[serde_json::Value]) {
        tracing::debug!(count = records.len(), "Importing records");
        match self.api.bulk_insert(records).await {
            Ok(_) => self.refresh().await,
            Err(error) => self.publish(failure("Failed to insert store todos", &error)),
        }
    }

    fn publish(&mut self, message: Message) {
        self.state = std::mem::take(&mut self.state).apply(message);
        self.snapshots.send_replace(self.state.clone());
    }

    fn reply(&self, reply: Reply) {
        // The caller may have stopped waiting; the state is published anyway.
        let _ = reply.send(self.state.clone());
    }
}

/// Builds the error slot message; the cause is prefixed with the operation.
fn failure(context: &str, error: &ClientError) -> Message {
    tracing::warn!(%error, context, "Todo store operation failed");
    Message::Failed(format!("{context}: {error}"))
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle for sending commands to a [`TodoStore`].
///
/// Every operation waits until the actor has processed it and returns the
/// resulting state. Remote failures land in [`ClientState::error`]; the
/// returned `Err` only means the actor is gone.
#[derive(Debug, Clone)]
pub struct TodoStoreHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ClientState>,
}

impl TodoStoreHandle {
    /// Fetches the full list and replaces the cached sequence.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Closed` if the actor has stopped.
    pub async fn refresh(&self) -> Result<ClientState, ClientError> {
        self.request(|reply| Command::Refresh { reply }).await
    }

    /// Creates a todo and appends it. Blank titles are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Closed` if the actor has stopped.
    pub async fn add(
        &self,
        title: impl Into<String>,
        due_date: Option<String>,
    ) -> Result<ClientState, ClientError> {
        let title = title.into();
        self.request(|reply| Command::Add {
            title,
            due_date,
            reply,
        })
        .await
    }

    /// Inverts the completion flag of a cached todo. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Closed` if the actor has stopped.
    pub async fn toggle(&self, id: TodoId) -> Result<ClientState, ClientError> {
        self.request(|reply| Command::Toggle { id, reply }).await
    }

    /// Deletes a todo and drops it from the cache once acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Closed` if the actor has stopped.
    pub async fn remove(&self, id: TodoId) -> Result<ClientState, ClientError> {
        self.request(|reply| Command::Remove { id, reply }).await
    }

    /// Changes the view filter.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Closed` if the actor has stopped.
    pub async fn set_filter(&self, mode: FilterMode) -> Result<ClientState, ClientError> {
        self.request(|reply| Command::SetFilter { mode, reply })
            .await
    }

    /// Bulk-inserts loosely shaped records, then refreshes.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Closed` if the actor has stopped.
    pub async fn import_records(
        &self,
        records: Vec<serde_json::Value>,
    ) -> Result<ClientState, ClientError> {
        self.request(|reply| Command::Import { records, reply })
            .await
    }

    /// Returns the most recently published state.
    #[must_use]
    pub fn snapshot(&self) -> ClientState {
        self.snapshots.borrow().clone()
    }

    /// Subscribes to every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.snapshots.clone()
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> Command,
    ) -> Result<ClientState, ClientError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ClientError::Closed)?;
        response.await.map_err(|_| ClientError::Closed)
    }
}

// =============================================================================
// Tests
// =============================================================================
