//! Ledger scripts: a list of named accounts and the steps to run against them.
//!
//! ```toml
//! accounts = ["alice", "bob"]
//!
//! [[step]]
//! account = "alice"
//! action = "deposit"
//! amount = 50
//! description = "salary"
//!
//! [[step]]
//! account = "alice"
//! action = "withdraw"
//! amount = 100
//! expect_error = "insufficient_funds"
//! ```
//!
//! Accounts listed under `accounts` are registered in the directory. A step
//! naming any other account targets an unregistered id. `show` refers to
//! statements by their position among those recorded in this script for
//! `owner` (defaults to the step's own account).

use std::collections::HashMap;
use std::sync::Arc;

use fin_ledger::{
    BalanceSummary, Ledger, LedgerConfig, LedgerError, LedgerReader, LedgerWriter,
    ProjectionBuilder, RunningBalance, ValidationReport,
};
use fin_store::{InMemoryAccountDirectory, InMemoryStatementStore};
use fin_types::{AccountId, Balance, Statement, StatementId, StatementKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Step {
    pub account: String,
    #[serde(flatten)]
    pub action: Action,
    #[serde(default)]
    pub expect_error: Option<ErrorKind>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Deposit {
        amount: i64,
        #[serde(default)]
        description: String,
    },
    Withdraw {
        amount: i64,
        #[serde(default)]
        description: String,
    },
    Balance,
    Statements,
    Show {
        statement: usize,
        #[serde(default)]
        owner: Option<String>,
    },
    Summary,
    Audit,
    Count,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::Balance => "balance",
            Self::Statements => "statements",
            Self::Show { .. } => "show",
            Self::Summary => "summary",
            Self::Audit => "audit",
            Self::Count => "count",
        }
    }
}

/// Ledger error kinds a step can expect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAmount,
    AccountNotFound,
    InsufficientFunds,
    StatementNotFound,
    Storage,
}

impl ErrorKind {
    pub fn of(error: &LedgerError) -> Self {
        match error {
            LedgerError::InvalidAmount { .. } => Self::InvalidAmount,
            LedgerError::AccountNotFound(_) => Self::AccountNotFound,
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds,
            LedgerError::StatementNotFound { .. } => Self::StatementNotFound,
            LedgerError::Storage(_) => Self::Storage,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Recorded { statement: Statement },
    Balance { balance: Balance },
    Statements { history: Vec<RunningBalance> },
    Statement { statement: Statement },
    Summary { summary: BalanceSummary },
    Audit { report: ValidationReport },
    Count { count: u64 },
    Failed { error: ErrorKind, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub account: String,
    pub action: &'static str,
    pub outcome: Outcome,
    pub expected_error: Option<ErrorKind>,
    pub matched: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScriptReport {
    pub steps: Vec<StepReport>,
}

impl ScriptReport {
    pub fn mismatches(&self) -> usize {
        self.steps.iter().filter(|step| !step.matched).count()
    }
}

type MemoryLedger = Ledger<InMemoryAccountDirectory, InMemoryStatementStore>;

/// Runs scripts against a fresh in-memory ledger.
pub struct ScriptRunner {
    ledger: MemoryLedger,
    names: HashMap<String, AccountId>,
    recorded: HashMap<AccountId, Vec<StatementId>>,
}

impl ScriptRunner {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            ledger: Ledger::with_config(
                Arc::new(InMemoryAccountDirectory::new()),
                Arc::new(InMemoryStatementStore::new()),
                config,
            ),
            names: HashMap::new(),
            recorded: HashMap::new(),
        }
    }

    pub async fn run(&mut self, script: &Script) -> ScriptReport {
        for name in &script.accounts {
            let id = self.account(name);
            self.ledger.directory().insert(id);
        }

        let mut report = ScriptReport::default();
        for (index, step) in script.steps.iter().enumerate() {
            let outcome = match self.execute(step).await {
                Ok(outcome) => outcome,
                Err(error) => Outcome::Failed {
                    error: ErrorKind::of(&error),
                    message: error.to_string(),
                },
            };
            let actual_error = match &outcome {
                Outcome::Failed { error, .. } => Some(*error),
                _ => None,
            };
            report.steps.push(StepReport {
                index,
                account: step.account.clone(),
                action: step.action.name(),
                matched: actual_error == step.expect_error,
                outcome,
                expected_error: step.expect_error,
            });
        }
        report
    }

    async fn execute(&mut self, step: &Step) -> Result<Outcome, LedgerError> {
        let account = self.account(&step.account);
        let outcome = match &step.action {
            Action::Deposit {
                amount,
                description,
            } => {
                self.record(&account, StatementKind::Deposit, *amount, description)
                    .await?
            }
            Action::Withdraw {
                amount,
                description,
            } => {
                self.record(&account, StatementKind::Withdraw, *amount, description)
                    .await?
            }
            Action::Balance => Outcome::Balance {
                balance: self.ledger.balance(&account).await?,
            },
            Action::Statements => {
                let history = self.ledger.list_statements(&account).await?;
                Outcome::Statements {
                    history: ProjectionBuilder::running_balances(&history),
                }
            }
            Action::Show { statement, owner } => {
                let owner = owner
                    .as_deref()
                    .map(|name| self.account(name))
                    .unwrap_or_else(|| account.clone());
                let id = self
                    .recorded
                    .get(&owner)
                    .and_then(|ids| ids.get(*statement))
                    .cloned()
                    .unwrap_or_default();
                Outcome::Statement {
                    statement: self.ledger.get_statement(&account, &id).await?,
                }
            }
            Action::Summary => Outcome::Summary {
                summary: self.ledger.summary(&account).await?,
            },
            Action::Audit => Outcome::Audit {
                report: self.ledger.audit(&account).await?,
            },
            Action::Count => Outcome::Count {
                count: self.ledger.statement_count(&account).await?,
            },
        };
        Ok(outcome)
    }

    async fn record(
        &mut self,
        account: &AccountId,
        kind: StatementKind,
        amount: i64,
        description: &str,
    ) -> Result<Outcome, LedgerError> {
        let statement = self
            .ledger
            .record(account, kind, amount, description)
            .await?;
        self.recorded
            .entry(account.clone())
            .or_default()
            .push(statement.id().clone());
        Ok(Outcome::Recorded { statement })
    }

    /// Stable id for a script-level account name.
    fn account(&mut self, name: &str) -> AccountId {
        self.names.entry(name.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"
        accounts = ["alice", "bob"]

        [[step]]
        account = "alice"
        action = "deposit"
        amount = 50
        description = "x"

        [[step]]
        account = "alice"
        action = "withdraw"
        amount = 40
        description = "y"

        [[step]]
        account = "alice"
        action = "withdraw"
        amount = 100
        description = "z"
        expect_error = "insufficient_funds"

        [[step]]
        account = "alice"
        action = "balance"

        [[step]]
        account = "mallory"
        action = "deposit"
        amount = 50
        expect_error = "account_not_found"

        [[step]]
        account = "bob"
        action = "show"
        owner = "alice"
        statement = 0
        expect_error = "statement_not_found"

        [[step]]
        account = "alice"
        action = "show"
        statement = 1
    "#;

    async fn run(raw: &str) -> ScriptReport {
        let script = Script::from_toml(raw).unwrap();
        ScriptRunner::new(LedgerConfig::default()).run(&script).await
    }

    #[test]
    fn parses_steps_and_expectations() {
        let script = Script::from_toml(SESSION).unwrap();
        assert_eq!(script.accounts, vec!["alice", "bob"]);
        assert_eq!(script.steps.len(), 7);
        assert_eq!(
            script.steps[0].action,
            Action::Deposit {
                amount: 50,
                description: "x".into()
            }
        );
        assert_eq!(script.steps[2].expect_error, Some(ErrorKind::InsufficientFunds));
        assert_eq!(script.steps[3].action, Action::Balance);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let raw = r#"
            [[step]]
            account = "alice"
            action = "transfer"
        "#;
        assert!(Script::from_toml(raw).is_err());
    }

    #[tokio::test]
    async fn session_matches_all_expectations() {
        let report = run(SESSION).await;
        assert_eq!(report.mismatches(), 0, "{report:#?}");
        assert_eq!(report.steps[3].outcome, Outcome::Balance { balance: 10 });

        match &report.steps[6].outcome {
            Outcome::Statement { statement } => {
                assert_eq!(statement.kind(), StatementKind::Withdraw);
                assert_eq!(statement.amount().get(), 40);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_failure_is_a_mismatch() {
        let report = run(
            r#"
            accounts = ["alice"]

            [[step]]
            account = "alice"
            action = "withdraw"
            amount = 1
            "#,
        )
        .await;
        assert_eq!(report.mismatches(), 1);
        assert!(matches!(
            report.steps[0].outcome,
            Outcome::Failed {
                error: ErrorKind::InsufficientFunds,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_expected_failure_is_a_mismatch() {
        let report = run(
            r#"
            accounts = ["alice"]

            [[step]]
            account = "alice"
            action = "deposit"
            amount = 5
            expect_error = "invalid_amount"
            "#,
        )
        .await;
        assert_eq!(report.mismatches(), 1);
    }

    #[tokio::test]
    async fn zero_amount_is_invalid() {
        let report = run(
            r#"
            accounts = ["alice"]

            [[step]]
            account = "alice"
            action = "deposit"
            amount = 0
            expect_error = "invalid_amount"
            "#,
        )
        .await;
        assert_eq!(report.mismatches(), 0);
    }

    #[tokio::test]
    async fn summary_and_audit_steps() {
        let report = run(
            r#"
            accounts = ["alice"]

            [[step]]
            account = "alice"
            action = "deposit"
            amount = 50

            [[step]]
            account = "alice"
            action = "summary"

            [[step]]
            account = "alice"
            action = "audit"

            [[step]]
            account = "alice"
            action = "statements"

            [[step]]
            account = "alice"
            action = "count"
            "#,
        )
        .await;
        assert_eq!(report.mismatches(), 0);
        assert_eq!(report.steps[4].outcome, Outcome::Count { count: 1 });
        assert!(matches!(
            &report.steps[1].outcome,
            Outcome::Summary { summary } if summary.balance == 50
        ));
        assert!(matches!(
            &report.steps[2].outcome,
            Outcome::Audit { report } if report.is_valid()
        ));
        assert!(matches!(
            &report.steps[3].outcome,
            Outcome::Statements { history } if history.len() == 1 && history[0].balance_after == 50
        ));
    }

    #[tokio::test]
    async fn report_serializes_to_json() {
        let report = run(SESSION).await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steps"][2]["outcome"]["result"], "failed");
        assert_eq!(json["steps"][2]["outcome"]["error"], "insufficient_funds");
        assert_eq!(json["steps"][3]["outcome"]["balance"], 10);
    }
}
