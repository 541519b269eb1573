//! Error types for table-count-diff.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant that can come out of a comparison names the database and table
//! involved so the operator can tell which side of the run failed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to open database '{database}': {message}")]
    ConnectionOpen {
        database: String,
        message: String,
        suggestion: String,
    },

    #[error("Failed to acquire a connection from '{database}' for table '{table}': {message}")]
    ConnectionAcquire {
        database: String,
        table: String,
        message: String,
    },

    #[error("Row count query failed on '{database}' for table '{table}': {message}")]
    QueryExecution {
        database: String,
        table: String,
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Row count for table '{table}' on '{database}' was cancelled")]
    Cancelled { database: String, table: String },

    #[error("Comparison incomplete: expected {expected} results, received {received}")]
    Incomplete { expected: usize, received: usize },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection open error with a helpful suggestion.
    pub fn connection_open(
        database: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::ConnectionOpen {
            database: database.into(),
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a connection acquire error.
    pub fn connection_acquire(
        database: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConnectionAcquire {
            database: database.into(),
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a query execution error with optional SQL state.
    pub fn query_execution(
        database: impl Into<String>,
        table: impl Into<String>,
        message: impl Into<String>,
        sql_state: Option<String>,
    ) -> Self {
        Self::QueryExecution {
            database: database.into(),
            table: table.into(),
            message: message.into(),
            sql_state,
        }
    }

    pub fn cancelled(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self::Cancelled {
            database: database.into(),
            table: table.into(),
        }
    }

    pub fn incomplete(expected: usize, received: usize) -> Self {
        Self::Incomplete { expected, received }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify a sqlx error raised while acquiring a pooled connection.
    pub fn from_acquire_failure(database: &str, table: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                Self::connection_acquire(database, table, "timed out waiting for a pooled connection")
            }
            sqlx::Error::PoolClosed => {
                Self::connection_acquire(database, table, "connection pool is closed")
            }
            other => Self::connection_acquire(database, table, other.to_string()),
        }
    }

    /// Classify a sqlx error raised while running the count query.
    ///
    /// The connection is already held here, so every failure is `QueryExecution`;
    /// only server-reported errors carry a SQLSTATE.
    pub fn from_query_failure(database: &str, table: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                Self::query_execution(database, table, db_err.message(), code)
            }
            other => Self::query_execution(database, table, other.to_string(), None),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::ConnectionOpen { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Table the error is attributed to, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::ConnectionAcquire { table, .. }
            | Self::QueryExecution { table, .. }
            | Self::Cancelled { table, .. } => Some(table),
            _ => None,
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection_open("orders", "refused", "Check the server");
        assert!(err.to_string().contains("Failed to open database 'orders'"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::connection_open("orders", "refused", "Check the server");
        assert_eq!(err.suggestion(), Some("Check the server"));
        assert!(DbError::internal("boom").suggestion().is_none());
    }

    #[test]
    fn test_query_error_display_names_table() {
        let err = DbError::query_execution(
            "orders",
            "users",
            "relation does not exist",
            Some("42P01".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.contains("'orders'"));
        assert!(msg.contains("'users'"));
        assert_eq!(err.table(), Some("users"));
    }

    #[test]
    fn test_pool_timeout_classified_as_acquire() {
        let err = DbError::from_acquire_failure("orders", "users", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::ConnectionAcquire { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_any_acquire_error_is_acquire() {
        let err = DbError::from_acquire_failure("orders", "users", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::ConnectionAcquire { .. }));
    }

    #[test]
    fn test_io_error_mid_query_classified_as_query() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = DbError::from_query_failure("orders", "users", sqlx::Error::Io(io));
        assert!(matches!(err, DbError::QueryExecution { sql_state: None, .. }));
        assert!(err.to_string().contains("reset by peer"));
    }

    #[test]
    fn test_row_not_found_classified_as_query() {
        let err = DbError::from_query_failure("orders", "users", sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::QueryExecution { sql_state: None, .. }));
    }

    #[test]
    fn test_incomplete_display() {
        let err = DbError::incomplete(3, 2);
        assert_eq!(
            err.to_string(),
            "Comparison incomplete: expected 3 results, received 2"
        );
        assert!(err.table().is_none());
    }
}
