//! Repository factory for runtime backend selection.
//!
//! This module creates the record store based on environment configuration,
//! switching between the in-memory and `PostgreSQL` backends at runtime.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: connection pool size (default: 5)
//!
//! # Example
//!
//! ```ignore
//! use todo_sync::infrastructure::{RepositoryConfig, RepositoryFactory};
//!
//! let config = RepositoryConfig::from_env()?;
//! let repository = RepositoryFactory::new(config).create().await?;
//! let todos = repository.list().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use super::{InMemoryTodoRepository, PostgresTodoRepository, RepositoryError, TodoRepository};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage mode for the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// In-memory storage. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` JSONB document storage.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Storage mode for todo documents.
    pub storage_mode: StorageMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` contains an invalid value
    /// - `DATABASE_MAX_CONNECTIONS` is not a positive integer
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary key lookup.
    ///
    /// Empty and whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`RepositoryConfig::from_env`].
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_mode = read("STORAGE_MODE")
            .map(|value| value.parse())
            .transpose()?
            .unwrap_or_default();

        let max_connections = match read("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(count) if count > 0 => count,
                _ => return Err(ConfigurationError::InvalidMaxConnections(value)),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let config = Self {
            storage_mode,
            database_url: read("DATABASE_URL"),
            max_connections,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if the selected mode
    /// needs a database URL and none is set.
    pub const fn validate(&self) -> Result<(), ConfigurationError> {
        if matches!(self.storage_mode, StorageMode::Postgres) && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .database_url("postgres://localhost/todos")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database_url: Option<String>,
    max_connections: Option<u32>,
}

impl RepositoryConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Sets the `PostgreSQL` database URL.
    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the connection pool size.
    #[must_use]
    pub const fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = Some(count);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database_url: self.database_url,
            max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Invalid pool size.
    #[error("Invalid DATABASE_MAX_CONNECTIONS: '{0}'. Expected a positive integer")]
    InvalidMaxConnections(String),

    /// Missing `DATABASE_URL` when storage mode is Postgres.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// Schema creation failed.
    #[error("Schema initialization error: {0}")]
    Schema(#[from] RepositoryError),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Factory for creating the record store based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory with the given configuration.
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates the todo repository.
    ///
    /// For `PostgreSQL` this connects the pool and makes sure the `todos`
    /// table exists.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database connection or schema creation fails.
    pub async fn create(&self) -> Result<Arc<dyn TodoRepository>, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Arc::new(InMemoryTodoRepository::new())),
            StorageMode::Postgres => {
                let repository = self.create_postgres_repository().await?;
                repository.ensure_schema().await?;
                Ok(Arc::new(repository))
            }
        }
    }

    async fn create_postgres_repository(&self) -> Result<PostgresTodoRepository, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;

        Ok(PostgresTodoRepository::new(pool))
    }
}

// =============================================================================
// Tests
// =============================================================================
