use fin_types::{AccountId, Balance, Statement, StatementKind};
use serde::Serialize;

use crate::error::LedgerResult;
use crate::traits::LedgerReader;

/// Balance together with the history it was derived from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    pub account_id: AccountId,
    pub balance: Balance,
    pub deposits_total: Balance,
    pub withdrawals_total: Balance,
    pub statements: Vec<Statement>,
}

/// A statement paired with the balance immediately after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunningBalance {
    pub statement: Statement,
    pub balance_after: Balance,
}

/// Running sum of signed amounts, in the order given.
pub fn derive_balance<'a>(statements: impl IntoIterator<Item = &'a Statement>) -> Balance {
    statements
        .into_iter()
        .map(Statement::signed_amount)
        .sum()
}

/// Deterministic projection builders over an account's history.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    pub fn summary(account: &AccountId, statements: Vec<Statement>) -> BalanceSummary {
        let mut deposits_total: Balance = 0;
        let mut withdrawals_total: Balance = 0;
        for statement in &statements {
            match statement.kind() {
                StatementKind::Deposit => deposits_total += statement.amount().as_balance(),
                StatementKind::Withdraw => withdrawals_total += statement.amount().as_balance(),
            }
        }

        BalanceSummary {
            account_id: account.clone(),
            balance: deposits_total - withdrawals_total,
            deposits_total,
            withdrawals_total,
            statements,
        }
    }

    pub fn running_balances(statements: &[Statement]) -> Vec<RunningBalance> {
        let mut balance: Balance = 0;
        statements
            .iter()
            .map(|statement| {
                balance += statement.signed_amount();
                RunningBalance {
                    statement: statement.clone(),
                    balance_after: balance,
                }
            })
            .collect()
    }

    /// Build a summary from a single history read through `reader`.
    pub async fn summary_from<R: LedgerReader + ?Sized>(
        reader: &R,
        account: &AccountId,
    ) -> LedgerResult<BalanceSummary> {
        let statements = reader.list_statements(account).await?;
        Ok(Self::summary(account, statements))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fin_types::Amount;
    use proptest::prelude::*;

    use super::*;

    fn statement(account: &AccountId, kind: StatementKind, value: i64) -> Statement {
        Statement::new(
            account.clone(),
            kind,
            Amount::new(value).unwrap(),
            "projection test",
            Utc::now(),
        )
    }

    #[test]
    fn empty_history_has_zero_balance() {
        let account = AccountId::new();
        let summary = ProjectionBuilder::summary(&account, vec![]);
        assert_eq!(summary.balance, 0);
        assert!(summary.statements.is_empty());
        assert_eq!(derive_balance(&[]), 0);
    }

    #[test]
    fn summary_splits_totals_by_kind() {
        let account = AccountId::new();
        let history = vec![
            statement(&account, StatementKind::Deposit, 50),
            statement(&account, StatementKind::Withdraw, 40),
            statement(&account, StatementKind::Deposit, 5),
        ];
        let summary = ProjectionBuilder::summary(&account, history.clone());
        assert_eq!(summary.deposits_total, 55);
        assert_eq!(summary.withdrawals_total, 40);
        assert_eq!(summary.balance, 15);
        assert_eq!(summary.balance, derive_balance(&history));
        assert_eq!(summary.statements, history);
    }

    #[test]
    fn running_balances_track_each_step() {
        let account = AccountId::new();
        let history = vec![
            statement(&account, StatementKind::Deposit, 50),
            statement(&account, StatementKind::Withdraw, 40),
            statement(&account, StatementKind::Deposit, 100),
        ];
        let running: Vec<Balance> = ProjectionBuilder::running_balances(&history)
            .into_iter()
            .map(|r| r.balance_after)
            .collect();
        assert_eq!(running, vec![50, 10, 110]);
    }

    #[test]
    fn summary_serializes_to_json() {
        let account = AccountId::new();
        let summary = ProjectionBuilder::summary(
            &account,
            vec![statement(&account, StatementKind::Deposit, 50)],
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["balance"], 50);
        assert_eq!(json["statements"][0]["kind"], "deposit");
    }

    proptest! {
        #[test]
        fn summary_balance_matches_running_total(
            entries in prop::collection::vec((any::<bool>(), 1i64..1_000_000), 0..64)
        ) {
            let account = AccountId::new();
            let history: Vec<Statement> = entries
                .iter()
                .map(|&(is_deposit, value)| {
                    let kind = if is_deposit { StatementKind::Deposit } else { StatementKind::Withdraw };
                    statement(&account, kind, value)
                })
                .collect();

            let summary = ProjectionBuilder::summary(&account, history.clone());
            let running = ProjectionBuilder::running_balances(&history);

            prop_assert_eq!(summary.balance, derive_balance(&history));
            prop_assert_eq!(
                running.last().map(|r| r.balance_after).unwrap_or(0),
                summary.balance
            );
        }
    }
}
