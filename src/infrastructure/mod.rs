//! Infrastructure layer for the todo record store.
//!
//! - `repository`: the `TodoRepository` trait and its error type
//! - `in_memory`: process-local store
//! - `postgres`: `PostgreSQL` JSONB document store
//! - `factory`: backend selection from environment configuration

mod factory;
mod in_memory;
mod postgres;
mod repository;

pub use factory::{
    ConfigurationError, FactoryError, RepositoryConfig, RepositoryConfigBuilder,
    RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryTodoRepository;
pub use postgres::PostgresTodoRepository;
pub use repository::{RepositoryError, RepositoryFuture, TodoRepository};
