//! Error types for the migration system.

use strata_core::QueryError;

use crate::operations::MigrationOperation;

/// Errors that can occur while planning, applying or reverting migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A descriptor could not be compiled (bad index definition, etc.).
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// A DDL statement failed while a migration was running.
    ///
    /// Operations after the failing one were not attempted. `completed`
    /// lists the operations that ran before it; when `rolled_back` is set
    /// the backend discarded their effects too.
    #[error(
        "Migration failed at '{}' ({} operation(s) completed, rolled back: {rolled_back}): {message}\n  SQL: {sql}",
        .operation.description(),
        .completed.len()
    )]
    MigrationFailed {
        /// The operation that failed.
        operation: Box<MigrationOperation>,
        /// The statement that was being executed.
        sql: String,
        /// Operations that finished before the failure, in order.
        completed: Vec<MigrationOperation>,
        /// Whether the transaction was rolled back.
        rolled_back: bool,
        /// Backend error message.
        message: String,
    },

    /// The dialect cannot express an operation.
    #[error("Operation '{operation}' is not supported by the {dialect} dialect")]
    Unsupported {
        /// Description of the operation.
        operation: String,
        /// Dialect name.
        dialect: &'static str,
    },

    /// Invalid migration state.
    #[error("Invalid migration state: {0}")]
    InvalidState(String),

    /// Database error outside of DDL execution (introspection, connecting).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading/writing migration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
