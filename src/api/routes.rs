//! Route configuration for the todo Resource API.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | /api/todos | `list_todos` |
//! | POST | /api/todos | `create_todo` |
//! | POST | /api/todos/bulk | `bulk_insert` |
//! | PATCH | /api/todos/{id} | `update_completion` |
//! | DELETE | /api/todos/{id} | `delete_todo` |
//! | GET | /health | `health_check` |

use axum::Router;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, bulk_insert, create_todo, delete_todo, health_check, list_todos, update_completion,
};

/// Creates the Axum router with all API routes, request tracing and a
/// permissive CORS policy.
///
/// # Example
///
/// ```rust,ignore
/// let repository = RepositoryFactory::new(RepositoryConfig::from_env()?).create().await?;
/// let router = create_router(AppState::new(repository));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, router).await?;
/// ```
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Todo collection
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/bulk", post(bulk_insert))
        // Single todo
        .route(
            "/api/todos/{id}",
            patch(update_completion).delete(delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
