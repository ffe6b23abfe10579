use async_trait::async_trait;
use fin_types::{AccountId, Balance, Statement, StatementId, StatementKind};

use crate::error::LedgerResult;

/// Write boundary for ledger append operations.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Validate and append one statement for `account`.
    async fn record(
        &self,
        account: &AccountId,
        kind: StatementKind,
        amount: i64,
        description: &str,
    ) -> LedgerResult<Statement>;
}

/// Read boundary for ledger balance and history queries.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn balance(&self, account: &AccountId) -> LedgerResult<Balance>;

    async fn get_statement(
        &self,
        account: &AccountId,
        statement: &StatementId,
    ) -> LedgerResult<Statement>;

    /// Full history for `account`, oldest first.
    async fn list_statements(&self, account: &AccountId) -> LedgerResult<Vec<Statement>>;
}
