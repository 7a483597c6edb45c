//! Ledger error types.

use thiserror::Error;

/// Errors from ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger has been closed.
    #[error("ledger is closed")]
    Closed,

    /// A score left the representable range.
    #[error("score overflow for {workspace}/{user}")]
    Overflow {
        /// Workspace of the affected record.
        workspace: String,
        /// User of the affected record.
        user: String,
    },

    /// Underlying database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

impl From<redb::DatabaseError> for LedgerError {
    fn from(err: redb::DatabaseError) -> Self {
        LedgerError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for LedgerError {
    fn from(err: redb::TransactionError) -> Self {
        LedgerError::Database(err.to_string())
    }
}

impl From<redb::TableError> for LedgerError {
    fn from(err: redb::TableError) -> Self {
        LedgerError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for LedgerError {
    fn from(err: redb::StorageError) -> Self {
        LedgerError::Database(err.to_string())
    }
}

impl From<redb::CommitError> for LedgerError {
    fn from(err: redb::CommitError) -> Self {
        LedgerError::Database(err.to_string())
    }
}
