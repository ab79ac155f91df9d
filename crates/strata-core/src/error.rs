//! Error types for query compilation and index rendering.

use thiserror::Error;

/// Errors raised when a query descriptor is compiled to SQL.
///
/// Building a descriptor never fails; every error is reported at the
/// compilation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Malformed DSL input, such as an empty column list.
    #[error("invalid argument: {message} (in `{fragment}`)")]
    InvalidArgument {
        /// What was wrong.
        message: String,
        /// The SQL fragment being rendered when the problem was found.
        fragment: String,
    },

    /// A descriptor references a column the table does not have.
    #[error("unknown column '{column}' on table '{table}' (in `{fragment}`)")]
    Compilation {
        /// Table the descriptor was compiled against.
        table: String,
        /// Offending column.
        column: String,
        /// The SQL fragment being rendered.
        fragment: String,
    },

    /// An attribute value was rejected by a validator.
    #[error("validation failed for '{attribute}': {message}")]
    ValidationFailed {
        /// Attribute whose value was rejected.
        attribute: String,
        /// Validator message.
        message: String,
    },
}

impl QueryError {
    /// Creates an `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            fragment: fragment.into(),
        }
    }
}

/// Result type alias for query compilation.
pub type Result<T> = std::result::Result<T, QueryError>;
