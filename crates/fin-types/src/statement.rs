use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{Amount, Balance};
use crate::error::TypeError;
use crate::identity::{AccountId, StatementId};

/// Kind of ledger event a statement records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Deposit,
    Withdraw,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }

    /// Apply this kind's sign to an amount.
    pub fn signed(&self, amount: Amount) -> Balance {
        match self {
            Self::Deposit => amount.as_balance(),
            Self::Withdraw => -amount.as_balance(),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

/// One immutable ledger record.
///
/// Statements are built fully formed by [`Statement::new`] and expose their
/// fields read-only. Once appended to a store they are never mutated or
/// deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    id: StatementId,
    account_id: AccountId,
    kind: StatementKind,
    amount: Amount,
    description: String,
    created_at: DateTime<Utc>,
}

impl Statement {
    /// Construct a statement with a freshly assigned id.
    pub fn new(
        account_id: AccountId,
        kind: StatementKind,
        amount: Amount,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StatementId::new(),
            account_id,
            kind,
            amount,
            description: description.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &StatementId {
        &self.id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Contribution of this statement to the account balance.
    pub fn signed_amount(&self) -> Balance {
        self.kind.signed(self.amount)
    }

    pub fn belongs_to(&self, account: &AccountId) -> bool {
        &self.account_id == account
    }
}
