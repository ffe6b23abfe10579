use std::collections::HashSet;

use fin_types::{AccountId, Balance, Statement, StatementId, StatementKind};
use serde::Serialize;

/// Result of auditing one account's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub account_id: AccountId,
    pub statement_count: u64,
    pub final_balance: Balance,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific invariant violation found in a history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Zero-based position in the history.
    pub position: usize,
    pub statement: StatementId,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    ForeignStatement,
    DuplicateId,
    TimestampRegression,
    Overdraft,
}

/// Re-checks a stored history against the ledger invariants.
pub struct HistoryValidator;

impl HistoryValidator {
    pub fn validate(account: &AccountId, statements: &[Statement]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();
        let mut balance: Balance = 0;

        for (position, statement) in statements.iter().enumerate() {
            let mut flag = |kind: ViolationKind, description: String| {
                violations.push(Violation {
                    position,
                    statement: statement.id().clone(),
                    kind,
                    description,
                });
            };

            if !statement.belongs_to(account) {
                flag(
                    ViolationKind::ForeignStatement,
                    format!("statement belongs to {}", statement.account_id()),
                );
            }

            if !seen.insert(statement.id().clone()) {
                flag(ViolationKind::DuplicateId, "id already appeared earlier".into());
            }

            if let Some(previous) = position.checked_sub(1).map(|p| &statements[p]) {
                if statement.created_at() < previous.created_at() {
                    flag(
                        ViolationKind::TimestampRegression,
                        format!(
                            "created_at {} precedes previous {}",
                            statement.created_at(),
                            previous.created_at()
                        ),
                    );
                }
            }

            if statement.kind() == StatementKind::Withdraw
                && balance < statement.amount().as_balance()
            {
                flag(
                    ViolationKind::Overdraft,
                    format!(
                        "withdraw of {} against balance {balance}",
                        statement.amount()
                    ),
                );
            }

            balance += statement.signed_amount();
        }

        ValidationReport {
            account_id: account.clone(),
            statement_count: statements.len() as u64,
            final_balance: balance,
            violations,
        }
    }
}
