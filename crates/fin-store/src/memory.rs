use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use fin_types::{AccountId, Statement, StatementId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{AccountDirectory, StatementStore};

/// In-memory account directory.
///
/// Holds a set of known account ids behind a `RwLock`. Data is lost when the
/// directory is dropped.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: RwLock<HashSet<AccountId>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with `accounts`.
    pub fn with_accounts(accounts: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().collect()),
        }
    }

    /// Create and register a fresh account.
    pub fn register(&self) -> AccountId {
        let id = AccountId::new();
        self.insert(id.clone());
        id
    }

    /// Register an existing id. Returns `false` if it was already known.
    pub fn insert(&self, account: AccountId) -> bool {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account)
    }

    /// Forget an account. Returns `true` if it was known.
    pub fn remove(&self, account: &AccountId) -> bool {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(account)
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn exists(&self, account: &AccountId) -> StoreResult<bool> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::Poisoned("directory read lock poisoned".into()))?;
        Ok(accounts.contains(account))
    }
}

/// In-memory, append-only statement store.
///
/// Keeps one global log in append order plus two indexes: positions per
/// account and position per statement id. Everything lives behind a single
/// `RwLock`, so each append is atomic with respect to readers.
#[derive(Default)]
pub struct InMemoryStatementStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    log: Vec<Statement>,
    by_account: HashMap<AccountId, Vec<usize>>,
    by_id: HashMap<StatementId, usize>,
}

impl StoreState {
    fn history(&self, account: &AccountId) -> impl Iterator<Item = &Statement> + '_ {
        self.by_account
            .get(account)
            .into_iter()
            .flatten()
            .map(|&position| &self.log[position])
    }
}

impl InMemoryStatementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of statements across all accounts.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .log
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Accounts with at least one statement, sorted.
    pub fn accounts(&self) -> Vec<AccountId> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<AccountId> = state.by_account.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Poisoned("statement store read lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Poisoned("statement store write lock poisoned".into()))
    }
}

#[async_trait]
impl StatementStore for InMemoryStatementStore {
    async fn append(&self, statement: &Statement) -> StoreResult<Statement> {
        let mut state = self.write()?;

        if state.by_id.contains_key(statement.id()) {
            return Err(StoreError::DuplicateStatement(statement.id().clone()));
        }

        let account = statement.account_id();
        if let Some(last) = state.history(account).last() {
            if statement.created_at() < last.created_at() {
                return Err(StoreError::OutOfOrder {
                    account: account.clone(),
                    last: last.created_at(),
                    attempted: statement.created_at(),
                });
            }
        }

        let position = state.log.len();
        state.log.push(statement.clone());
        state
            .by_account
            .entry(account.clone())
            .or_default()
            .push(position);
        state.by_id.insert(statement.id().clone(), position);

        debug!(
            statement = %statement.id(),
            account = %account,
            position,
            "statement appended"
        );
        Ok(statement.clone())
    }

    async fn list_by_account(&self, account: &AccountId) -> StoreResult<Vec<Statement>> {
        let state = self.read()?;
        Ok(state.history(account).cloned().collect())
    }

    async fn find_by_id(
        &self,
        account: &AccountId,
        id: &StatementId,
    ) -> StoreResult<Option<Statement>> {
        let state = self.read()?;
        Ok(state
            .by_id
            .get(id)
            .map(|&position| &state.log[position])
            .filter(|statement| statement.belongs_to(account))
            .cloned())
    }

    async fn count_by_account(&self, account: &AccountId) -> StoreResult<u64> {
        let state = self.read()?;
        Ok(state
            .by_account
            .get(account)
            .map(|positions| positions.len() as u64)
            .unwrap_or(0))
    }
}

impl std::fmt::Debug for InMemoryStatementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStatementStore")
            .field("statement_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use fin_types::{Amount, StatementKind};

    fn deposit(account: &AccountId, value: i64) -> Statement {
        Statement::new(
            account.clone(),
            StatementKind::Deposit,
            Amount::new(value).unwrap(),
            "deposit",
            Utc::now(),
        )
    }

    // -----------------------------------------------------------------------
    // Directory
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn registered_accounts_exist() {
        let directory = InMemoryAccountDirectory::new();
        let id = directory.register();
        assert!(directory.exists(&id).await.unwrap());
        assert!(!directory.exists(&AccountId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn removed_accounts_stop_existing() {
        let id = AccountId::new();
        let directory = InMemoryAccountDirectory::with_accounts([id.clone()]);
        assert_eq!(directory.len(), 1);
        assert!(directory.remove(&id));
        assert!(!directory.exists(&id).await.unwrap());
        assert!(directory.is_empty());
    }

    #[test]
    fn insert_reports_duplicates() {
        let directory = InMemoryAccountDirectory::new();
        let id = AccountId::new();
        assert!(directory.insert(id.clone()));
        assert!(!directory.insert(id));
    }

    // -----------------------------------------------------------------------
    // Append / read
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn append_returns_what_was_stored() {
        let store = InMemoryStatementStore::new();
        let account = AccountId::new();
        let statement = deposit(&account, 50);

        let stored = store.append(&statement).await.unwrap();
        assert_eq!(stored, statement);

        let found = store
            .find_by_id(&account, statement.id())
            .await
            .unwrap()
            .expect("should exist");
        assert_eq!(found, statement);
    }

    #[tokio::test]
    async fn list_preserves_append_order() {
        let store = InMemoryStatementStore::new();
        let account = AccountId::new();
        let first = deposit(&account, 1);
        let second = deposit(&account, 2);
        let third = deposit(&account, 3);
        for s in [&first, &second, &third] {
            store.append(s).await.unwrap();
        }

        let history = store.list_by_account(&account).await.unwrap();
        let amounts: Vec<i64> = history.iter().map(|s| s.amount().get()).collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn list_for_unknown_account_is_empty() {
        let store = InMemoryStatementStore::new();
        assert!(store
            .list_by_account(&AccountId::new())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.count_by_account(&AccountId::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn histories_are_partitioned_by_account() {
        let store = InMemoryStatementStore::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        store.append(&deposit(&alice, 10)).await.unwrap();
        store.append(&deposit(&bob, 20)).await.unwrap();
        store.append(&deposit(&alice, 30)).await.unwrap();

        assert_eq!(store.count_by_account(&alice).await.unwrap(), 2);
        assert_eq!(store.count_by_account(&bob).await.unwrap(), 1);
        assert_eq!(store.len(), 3);

        let mut expected = vec![alice, bob];
        expected.sort();
        assert_eq!(store.accounts(), expected);
    }

    // -----------------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn find_by_id_is_scoped_to_account() {
        let store = InMemoryStatementStore::new();
        let owner = AccountId::new();
        let other = AccountId::new();
        let statement = deposit(&owner, 5);
        store.append(&statement).await.unwrap();

        assert!(store
            .find_by_id(&other, statement.id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = InMemoryStatementStore::new();
        let statement = deposit(&AccountId::new(), 5);
        store.append(&statement).await.unwrap();

        let err = store.append(&statement).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateStatement(statement.id().clone()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn timestamp_regression_is_rejected() {
        let store = InMemoryStatementStore::new();
        let account = AccountId::new();
        let now = Utc::now();
        let amount = Amount::new(1).unwrap();
        let later = Statement::new(account.clone(), StatementKind::Deposit, amount, "", now);
        let earlier = Statement::new(
            account.clone(),
            StatementKind::Deposit,
            amount,
            "",
            now - Duration::seconds(5),
        );

        store.append(&later).await.unwrap();
        let err = store.append(&earlier).await.unwrap_err();
        assert!(matches!(err, StoreError::OutOfOrder { account: a, .. } if a == account));
        assert_eq!(store.count_by_account(&account).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn equal_timestamps_are_accepted() {
        let store = InMemoryStatementStore::new();
        let account = AccountId::new();
        let now = Utc::now();
        let amount = Amount::new(1).unwrap();
        for _ in 0..3 {
            let s = Statement::new(account.clone(), StatementKind::Deposit, amount, "", now);
            store.append(&s).await.unwrap();
        }
        assert_eq!(store.count_by_account(&account).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn concurrent_appends_to_distinct_accounts() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryStatementStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let account = AccountId::new();
                    for value in 1..=10 {
                        store.append(&deposit(&account, value)).await.unwrap();
                    }
                    account
                })
            })
            .collect();

        for handle in handles {
            let account = handle.await.unwrap();
            assert_eq!(store.count_by_account(&account).await.unwrap(), 10);
        }
        assert_eq!(store.len(), 80);
    }
}
