//! Common test helpers for integration tests.
//!
//! This module provides `AppState` construction, record stores that fail on
//! demand, an in-process request helper and a loopback server for end-to-end
//! client tests.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every
//! helper.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use todo_sync::api::{AppState, create_router};
use todo_sync::domain::{Todo, TodoId};
use todo_sync::infrastructure::{
    InMemoryTodoRepository, RepositoryError, RepositoryFuture, TodoRepository,
};

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates a test `AppState` backed by an empty in-memory store.
pub fn create_test_app_state() -> AppState {
    AppState::new(Arc::new(InMemoryTodoRepository::new()))
}

/// Creates a test `AppState` whose store fails every operation.
pub fn create_failing_app_state() -> AppState {
    AppState::new(Arc::new(FailingTodoRepository))
}

/// Creates a test `AppState` whose in-memory store can be taken offline.
pub fn create_switchable_app_state() -> (AppState, Arc<SwitchableTodoRepository>) {
    let repository = Arc::new(SwitchableTodoRepository::default());
    (AppState::new(repository.clone()), repository)
}

/// Record store that is never reachable for reads and rejects every write.
pub struct FailingTodoRepository;

impl TodoRepository for FailingTodoRepository {
    fn list(&self) -> RepositoryFuture<'_, Vec<Todo>> {
        Box::pin(async { Err(unavailable()) })
    }

    fn insert(&self, _todo: &Todo) -> RepositoryFuture<'_, ()> {
        Box::pin(async { Err(rejected()) })
    }

    fn insert_many(&self, _todos: &[Todo]) -> RepositoryFuture<'_, ()> {
        Box::pin(async { Err(rejected()) })
    }

    fn set_completed(&self, _id: &TodoId, _completed: bool) -> RepositoryFuture<'_, Option<Todo>> {
        Box::pin(async { Err(rejected()) })
    }

    fn delete(&self, _id: &TodoId) -> RepositoryFuture<'_, bool> {
        Box::pin(async { Err(rejected()) })
    }
}

/// In-memory record store that fails every operation while offline.
#[derive(Default)]
pub struct SwitchableTodoRepository {
    inner: InMemoryTodoRepository,
    offline: AtomicBool,
}

impl SwitchableTodoRepository {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

impl TodoRepository for SwitchableTodoRepository {
    fn list(&self) -> RepositoryFuture<'_, Vec<Todo>> {
        if self.is_offline() {
            return Box::pin(async { Err(unavailable()) });
        }
        self.inner.list()
    }

    fn insert(&self, todo: &Todo) -> RepositoryFuture<'_, ()> {
        if self.is_offline() {
            return Box::pin(async { Err(rejected()) });
        }
        self.inner.insert(todo)
    }

    fn insert_many(&self, todos: &[Todo]) -> RepositoryFuture<'_, ()> {
        if self.is_offline() {
            return Box::pin(async { Err(rejected()) });
        }
        self.inner.insert_many(todos)
    }

    fn set_completed(&self, id: &TodoId, completed: bool) -> RepositoryFuture<'_, Option<Todo>> {
        if self.is_offline() {
            return Box::pin(async { Err(rejected()) });
        }
        self.inner.set_completed(id, completed)
    }

    fn delete(&self, id: &TodoId) -> RepositoryFuture<'_, bool> {
        if self.is_offline() {
            return Box::pin(async { Err(rejected()) });
        }
        self.inner.delete(id)
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::StoreUnavailable("connection refused".to_string())
}

fn rejected() -> RepositoryError {
    RepositoryError::StoreWrite("write rejected".to_string())
}

// =============================================================================
// In-Process Requests
// =============================================================================

/// Sends one request through the router and returns status and JSON body.
///
/// An empty response body decodes to `Value::Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Creates a todo through the router and returns its JSON representation.
pub async fn create_todo(router: &Router, task: &str) -> serde_json::Value {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/todos",
        Some(serde_json::json!({ "task": task })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body
}

// =============================================================================
// Loopback Server
// =============================================================================

/// Serves the router on an ephemeral loopback port.
///
/// Returns the API base URL (ending in `/api`) and the server task.
pub async fn spawn_test_server(state: AppState) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let router = create_router(state);

    let task = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{address}/api"), task)
}
