//! HTTP client for the todo Resource API.
//!
//! [`TodoApi`] is the seam the client state cache talks to; [`HttpTodoApi`]
//! is its `reqwest` implementation.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{
    ApiError, BulkInsertResponse, CreateTodoRequest, MessageResponse, TodoResponse,
    UpdateCompletionRequest,
};
use crate::domain::{Timestamp, Todo, TodoId};

/// Default base URL of the Resource API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default transport timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Client Error
// =============================================================================

/// Errors seen by the client side.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("Network failure: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message taken from the error body, or the status reason.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The client state actor is no longer running.
    #[error("Todo store has shut down")]
    Closed,
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Future returned by every client API operation.
pub type ClientFuture<'a, T> = BoxFuture<'a, Result<T, ClientError>>;

// =============================================================================
// Todo API
// =============================================================================

/// Remote operations the client state cache depends on.
pub trait TodoApi: Send + Sync {
    /// Fetches every todo.
    fn list(&self) -> ClientFuture<'_, Vec<Todo>>;

    /// Creates a todo and returns the stored representation.
    fn create(&self, title: &str, due_date: Option<&str>) -> ClientFuture<'_, Todo>;

    /// Sets the completion flag and returns the updated todo.
    fn set_completed(&self, id: &TodoId, completed: bool) -> ClientFuture<'_, Todo>;

    /// Deletes a todo.
    fn delete(&self, id: &TodoId) -> ClientFuture<'_, ()>;

    /// Inserts a batch of loosely shaped records; returns how many were stored.
    fn bulk_insert(&self, records: &[serde_json::Value]) -> ClientFuture<'_, usize>;
}

fn decode_error(error: impl std::fmt::Display) -> ClientError {
    ClientError::Decode(error.to_string())
}

impl TryFrom<TodoResponse> for Todo {
    type Error = ClientError;

    fn try_from(response: TodoResponse) -> Result<Self, Self::Error> {
        let id: TodoId = response.id.parse().map_err(decode_error)?;
        let created_at = Timestamp::parse_flexible(&response.created_at).map_err(decode_error)?;
        let due_date = response
            .due_date
            .as_deref()
            .map(Timestamp::parse_flexible)
            .transpose()
            .map_err(decode_error)?;

        let todo = Self::new(id, response.title, created_at)
            .with_completed(response.completed)
            .with_due_date(due_date);
        Ok(match response.description {
            Some(description) => todo.with_description(description),
            None => todo,
        })
    }
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// `reqwest` implementation of [`TodoApi`].
///
/// # Example
///
/// ```ignore
/// let api = HttpTodoApi::new("http://localhost:5000/api", Duration::from_secs(10))?;
/// let todos = api.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    /// Creates a client for the API rooted at `base_url` (e.g. `http://host:5000/api`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        parse_response(response).await
    }
}

/// Decodes a success body, or turns an error status into `ClientError::Server`.
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|error| ClientError::Decode(error.to_string()));
    }

    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

impl TodoApi for HttpTodoApi {
    fn list(&self) -> ClientFuture<'_, Vec<Todo>> {
        Box::pin(async move {
            let responses: Vec<TodoResponse> =
                Self::send(self.client.get(self.url("/todos"))).await?;
            responses.into_iter().map(Todo::try_from).collect()
        })
    }

    fn create(&self, title: &str, due_date: Option<&str>) -> ClientFuture<'_, Todo> {
        let request = CreateTodoRequest {
            task: Some(title.to_string()),
            due_date: due_date.map(str::to_string),
            ..CreateTodoRequest::default()
        };
        Box::pin(async move {
            let response: TodoResponse =
                Self::send(self.client.post(self.url("/todos")).json(&request)).await?;
            Todo::try_from(response)
        })
    }

    fn set_completed(&self, id: &TodoId, completed: bool) -> ClientFuture<'_, Todo> {
        let url = self.url(&format!("/todos/{id}"));
        Box::pin(async move {
            let request = UpdateCompletionRequest { completed };
            let response: TodoResponse =
                Self::send(self.client.patch(url).json(&request)).await?;
            Todo::try_from(response)
        })
    }

    fn delete(&self, id: &TodoId) -> ClientFuture<'_, ()> {
        let url = self.url(&format!("/todos/{id}"));
        Box::pin(async move {
            let _: MessageResponse = Self::send(self.client.delete(url)).await?;
            Ok(())
        })
    }

    fn bulk_insert(&self, records: &[serde_json::Value]) -> ClientFuture<'_, usize> {
        let records = records.to_vec();
        Box::pin(async move {
            let response: BulkInsertResponse =
                Self::send(self.client.post(self.url("/todos/bulk")).json(&records)).await?;
            Ok(response.inserted)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
