use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fin_store::{AccountDirectory, StatementStore};
use fin_types::{AccountId, Amount, Balance, Statement, StatementId, StatementKind};
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::locks::AccountLocks;
use crate::projection::{derive_balance, BalanceSummary, ProjectionBuilder};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{HistoryValidator, ValidationReport};

/// The ledger core.
///
/// Validates and appends statements through a [`StatementStore`], resolving
/// accounts through an [`AccountDirectory`]. The only state it keeps between
/// calls is the per-account lock map that serializes `record` on one account.
pub struct Ledger<D, S> {
    directory: Arc<D>,
    store: Arc<S>,
    locks: AccountLocks,
    config: LedgerConfig,
}

impl<D, S> Ledger<D, S>
where
    D: AccountDirectory,
    S: StatementStore,
{
    pub fn new(directory: Arc<D>, store: Arc<S>) -> Self {
        Self::with_config(directory, store, LedgerConfig::default())
    }

    pub fn with_config(directory: Arc<D>, store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            directory,
            store,
            locks: AccountLocks::new(config.lock_prune_threshold),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Balance plus the statements it was derived from, from one history read.
    pub async fn summary(&self, account: &AccountId) -> LedgerResult<BalanceSummary> {
        ProjectionBuilder::summary_from(self, account).await
    }

    /// Re-check the stored history of `account` against the ledger invariants.
    pub async fn audit(&self, account: &AccountId) -> LedgerResult<ValidationReport> {
        let history = self.list_statements(account).await?;
        let report = HistoryValidator::validate(account, &history);
        if !report.is_valid() {
            warn!(
                account = %account,
                violations = report.violations.len(),
                "history audit found violations"
            );
        }
        Ok(report)
    }

    /// Number of statements recorded for `account`, from the store's index.
    pub async fn statement_count(&self, account: &AccountId) -> LedgerResult<u64> {
        self.ensure_account(account).await?;
        Ok(self.store.count_by_account(account).await?)
    }

    async fn ensure_account(&self, account: &AccountId) -> LedgerResult<()> {
        if self.directory.exists(account).await? {
            Ok(())
        } else {
            debug!(account = %account, "account not found");
            Err(LedgerError::AccountNotFound(account.clone()))
        }
    }
}

#[async_trait]
impl<D, S> LedgerWriter for Ledger<D, S>
where
    D: AccountDirectory,
    S: StatementStore,
{
    /// Validate and append one statement.
    ///
    /// Checks run in order: positive amount, known account, sufficient funds
    /// for a withdraw. The account lock is taken after the directory lookup
    /// and held across the history read and the append only.
    ///
    /// Dropping the future before the store acknowledges the append leaves no
    /// statement behind; once acknowledged the statement stays committed.
    async fn record(
        &self,
        account: &AccountId,
        kind: StatementKind,
        amount: i64,
        description: &str,
    ) -> LedgerResult<Statement> {
        let amount = Amount::new(amount).map_err(|_| LedgerError::InvalidAmount { amount })?;
        self.ensure_account(account).await?;

        let _guard = self.locks.acquire(account).await;

        let history = self.store.list_by_account(account).await?;
        let balance = derive_balance(&history);
        if kind == StatementKind::Withdraw && balance < amount.as_balance() {
            warn!(
                account = %account,
                balance = %balance,
                requested = amount.get(),
                "withdraw rejected: insufficient funds"
            );
            return Err(LedgerError::InsufficientFunds {
                account: account.clone(),
                balance,
                requested: amount.get(),
            });
        }

        let created_at = next_created_at(history.last(), Utc::now());
        let statement = Statement::new(account.clone(), kind, amount, description, created_at);
        let stored = self.store.append(&statement).await?;

        info!(
            statement = %stored.id(),
            account = %account,
            kind = %kind,
            amount = amount.get(),
            balance = %(balance + stored.signed_amount()),
            "statement recorded"
        );
        Ok(stored)
    }
}

#[async_trait]
impl<D, S> LedgerReader for Ledger<D, S>
where
    D: AccountDirectory,
    S: StatementStore,
{
    async fn balance(&self, account: &AccountId) -> LedgerResult<Balance> {
        let history = self.list_statements(account).await?;
        Ok(derive_balance(&history))
    }

    async fn get_statement(
        &self,
        account: &AccountId,
        statement: &StatementId,
    ) -> LedgerResult<Statement> {
        self.ensure_account(account).await?;
        self.store
            .find_by_id(account, statement)
            .await?
            .filter(|found| found.belongs_to(account))
            .ok_or_else(|| LedgerError::StatementNotFound {
                account: account.clone(),
                statement: statement.clone(),
            })
    }

    async fn list_statements(&self, account: &AccountId) -> LedgerResult<Vec<Statement>> {
        self.ensure_account(account).await?;
        let history = self.store.list_by_account(account).await?;
        debug!(account = %account, statements = history.len(), "history read");
        Ok(history)
    }
}

/// Timestamp for the next statement of an account: the current time, held
/// back to never precede the account's previous statement.
pub fn next_created_at(previous: Option<&Statement>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(previous) if previous.created_at() > now => previous.created_at(),
        _ => now,
    }
}
