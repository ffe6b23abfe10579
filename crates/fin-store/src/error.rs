use chrono::{DateTime, Utc};
use fin_types::{AccountId, StatementId};

/// Errors from directory and statement store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A statement with this id was already appended.
    #[error("duplicate statement id: {0}")]
    DuplicateStatement(StatementId),

    /// The append would move the account's timestamps backwards.
    #[error("out-of-order append for {account}: last {last}, attempted {attempted}")]
    OutOfOrder {
        account: AccountId,
        last: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    /// A lock guarding backend state was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
