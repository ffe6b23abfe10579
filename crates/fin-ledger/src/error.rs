use fin_store::StoreError;
use fin_types::{AccountId, Balance, StatementId};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid amount: {amount} (must be positive)")]
    InvalidAmount { amount: i64 },

    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("insufficient funds in {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Balance,
        requested: i64,
    },

    #[error("statement {statement} not found for account {account}")]
    StatementNotFound {
        account: AccountId,
        statement: StatementId,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Only collaborator failures may succeed on retry; every other error is
    /// a verdict on the request itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_errors_are_retryable() {
        let account = AccountId::new();
        assert!(LedgerError::Storage(StoreError::Unavailable("down".into())).is_retryable());
        assert!(!LedgerError::InvalidAmount { amount: 0 }.is_retryable());
        assert!(!LedgerError::AccountNotFound(account.clone()).is_retryable());
        assert!(!LedgerError::InsufficientFunds {
            account: account.clone(),
            balance: 10,
            requested: 100,
        }
        .is_retryable());
        assert!(!LedgerError::StatementNotFound {
            account,
            statement: StatementId::new(),
        }
        .is_retryable());
    }

    #[test]
    fn insufficient_funds_message_names_both_amounts() {
        let err = LedgerError::InsufficientFunds {
            account: AccountId::new(),
            balance: 10,
            requested: 100,
        };
        let message = err.to_string();
        assert!(message.contains("balance 10"));
        assert!(message.contains("requested 100"));
    }
}
