use async_trait::async_trait;
use fin_types::{AccountId, Statement, StatementId};

use crate::error::StoreResult;

/// Existence check against the system that owns accounts.
///
/// A lookup must not block longer than a single round-trip to the backing
/// directory.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn exists(&self, account: &AccountId) -> StoreResult<bool>;
}

/// Append-only statement log.
///
/// All implementations must satisfy these invariants:
/// - Appended statements are never mutated or removed.
/// - An append is atomic: readers see the log either before or after it.
/// - `list_by_account` returns statements in append order (oldest first).
/// - Statement ids are unique across the whole store; a duplicate append
///   fails instead of overwriting.
#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Append a statement and return exactly what was persisted.
    async fn append(&self, statement: &Statement) -> StoreResult<Statement>;

    /// All statements for `account`, in append order.
    ///
    /// Returns an empty vector for an account without history.
    async fn list_by_account(&self, account: &AccountId) -> StoreResult<Vec<Statement>>;

    /// Look up a statement by id, scoped to `account`.
    ///
    /// Returns `Ok(None)` when the id is unknown or belongs to another account.
    async fn find_by_id(
        &self,
        account: &AccountId,
        id: &StatementId,
    ) -> StoreResult<Option<Statement>>;

    /// Number of statements recorded for `account`.
    ///
    /// Default implementation lists the history. Backends may override with
    /// an indexed count.
    async fn count_by_account(&self, account: &AccountId) -> StoreResult<u64> {
        Ok(self.list_by_account(account).await?.len() as u64)
    }
}
