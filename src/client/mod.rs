//! Client side of the todo list.
//!
//! - `api`: remote operations and their `reqwest` implementation
//! - `state`: the cached state and its pure transitions
//! - `store`: the actor that owns the state and talks to the API
//! - `view`: filter and date-label derivations

pub mod api;
pub mod state;
pub mod store;
pub mod view;

pub use api::{ClientError, ClientFuture, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpTodoApi, TodoApi};
pub use state::{ClientState, Message, TodoEntry};
pub use store::{TodoStore, TodoStoreHandle};
pub use view::{FilterMode, InvalidFilterMode, apply_filter, format_display_date};
