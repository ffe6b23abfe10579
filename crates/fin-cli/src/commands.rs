use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use fin_ledger::{Ledger, LedgerConfig, LedgerError, LedgerReader, LedgerWriter};
use fin_store::{InMemoryAccountDirectory, InMemoryStatementStore};
use fin_types::{AccountId, Balance, Statement, StatementKind};
use serde::Serialize;
use tracing::info;

use crate::cli::{Command, OutputFormat};
use crate::config::AppConfig;
use crate::script::{Outcome, Script, ScriptReport, ScriptRunner, StepReport};

const DEMO_SCRIPT: &str = r#"
accounts = ["alice", "bob"]

[[step]]
account = "alice"
action = "deposit"
amount = 50
description = "opening deposit"

[[step]]
account = "alice"
action = "withdraw"
amount = 40
description = "rent"

[[step]]
account = "alice"
action = "withdraw"
amount = 100
description = "overdraft attempt"
expect_error = "insufficient_funds"

[[step]]
account = "alice"
action = "statements"

[[step]]
account = "carol"
action = "deposit"
amount = 10
expect_error = "account_not_found"

[[step]]
account = "bob"
action = "show"
owner = "alice"
statement = 0
expect_error = "statement_not_found"

[[step]]
account = "alice"
action = "audit"
"#;

pub async fn run_command(command: Command, config: AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Command::Run(args) => cmd_run(&args.script, config.ledger, format).await,
        Command::Demo => cmd_demo(config.ledger, format).await,
    }
}

async fn cmd_run(path: &Path, config: LedgerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let script = Script::from_toml(&raw)
        .with_context(|| format!("parsing script {}", path.display()))?;
    info!(steps = script.steps.len(), "running script {}", path.display());

    let report = ScriptRunner::new(config).run(&script).await;
    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    check(&report)
}

#[derive(Debug, Serialize)]
struct DemoReport<'a> {
    script: &'a ScriptReport,
    race: &'a RaceReport,
}

/// Outcome of concurrent withdrawals against one funded account.
#[derive(Debug, Serialize)]
struct RaceReport {
    account: AccountId,
    opening_balance: Balance,
    withdrawals: Vec<i64>,
    accepted: usize,
    rejected: usize,
    final_balance: Balance,
}

async fn cmd_demo(config: LedgerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let script = Script::from_toml(DEMO_SCRIPT)?;
    let report = ScriptRunner::new(config.clone()).run(&script).await;
    let race = withdraw_race(config, 50, &[40, 40]).await?;

    match format {
        OutputFormat::Text => {
            print_report(&report);
            println!();
            print_race(&race);
        }
        OutputFormat::Json => {
            let demo = DemoReport {
                script: &report,
                race: &race,
            };
            println!("{}", serde_json::to_string_pretty(&demo)?);
        }
    }
    check(&report)?;
    check_race(&race)
}

/// Fund one account, then submit every withdrawal at once.
async fn withdraw_race(
    config: LedgerConfig,
    opening: i64,
    withdrawals: &[i64],
) -> anyhow::Result<RaceReport> {
    let directory = Arc::new(InMemoryAccountDirectory::new());
    let account = directory.register();
    let ledger = Arc::new(Ledger::with_config(
        directory,
        Arc::new(InMemoryStatementStore::new()),
        config,
    ));
    ledger
        .record(&account, StatementKind::Deposit, opening, "race funding")
        .await?;

    let tasks: Vec<_> = withdrawals
        .iter()
        .map(|&amount| {
            let ledger = Arc::clone(&ledger);
            let account = account.clone();
            tokio::spawn(async move {
                ledger
                    .record(&account, StatementKind::Withdraw, amount, "race withdrawal")
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await? {
            Ok(_) => accepted += 1,
            Err(LedgerError::InsufficientFunds { .. }) => rejected += 1,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(RaceReport {
        opening_balance: Balance::from(opening),
        withdrawals: withdrawals.to_vec(),
        accepted,
        rejected,
        final_balance: ledger.balance(&account).await?,
        account,
    })
}

/// Fails if the race overdrew the account or, for equal-sized withdrawals,
/// accepted a different number than the opening balance covers.
fn check_race(race: &RaceReport) -> anyhow::Result<()> {
    if race.final_balance < 0 {
        anyhow::bail!("race overdrew the account: balance {}", race.final_balance);
    }
    if let Some(expected) = expected_accepts(race.opening_balance, &race.withdrawals) {
        if race.accepted != expected {
            anyhow::bail!(
                "race accepted {} of {} withdrawals, expected {expected}",
                race.accepted,
                race.withdrawals.len()
            );
        }
    }
    Ok(())
}

/// Unequal sizes have no fixed answer; it depends on arrival order.
fn expected_accepts(opening: Balance, withdrawals: &[i64]) -> Option<usize> {
    let first = *withdrawals.first()?;
    if first <= 0 || withdrawals.iter().any(|&w| w != first) {
        return None;
    }
    let fits = usize::try_from(opening / Balance::from(first)).unwrap_or(usize::MAX);
    Some(withdrawals.len().min(fits))
}

fn check(report: &ScriptReport) -> anyhow::Result<()> {
    let mismatches = report.mismatches();
    if mismatches > 0 {
        anyhow::bail!("{mismatches} step(s) did not match their expectation");
    }
    Ok(())
}

fn print_report(report: &ScriptReport) {
    for step in &report.steps {
        print_step(step);
    }
    let mismatches = report.mismatches();
    if mismatches == 0 {
        println!("{} {} steps as expected", "✓".green().bold(), report.steps.len());
    } else {
        println!("{} {} mismatched", "✗".red().bold(), mismatches);
    }
}

fn print_step(step: &StepReport) {
    let mark = if step.matched { "✓".green() } else { "✗".red() };
    let head = format!("#{} {} {}", step.index, step.action, step.account.bold());
    match &step.outcome {
        Outcome::Recorded { statement } => {
            println!("{mark} {head}: recorded {}", format_statement(statement));
        }
        Outcome::Count { count } => {
            println!("{mark} {head}: {} statement(s)", count.to_string().bold());
        }
        Outcome::Balance { balance } => {
            println!("{mark} {head}: balance {}", balance.to_string().bold());
        }
        Outcome::Statements { history } => {
            println!("{mark} {head}: {} statement(s)", history.len());
            for entry in history {
                println!(
                    "    {}  → {}",
                    format_statement(&entry.statement),
                    entry.balance_after.to_string().bold()
                );
            }
        }
        Outcome::Statement { statement } => {
            println!("{mark} {head}: {}", format_statement(statement));
        }
        Outcome::Summary { summary } => {
            println!(
                "{mark} {head}: balance {} (in {}, out {}, {} statement(s))",
                summary.balance.to_string().bold(),
                summary.deposits_total,
                summary.withdrawals_total,
                summary.statements.len()
            );
        }
        Outcome::Audit { report } => {
            if report.is_valid() {
                println!(
                    "{mark} {head}: {} statement(s), no violations",
                    report.statement_count
                );
            } else {
                println!(
                    "{mark} {head}: {} violation(s)",
                    report.violations.len().to_string().red()
                );
                for violation in &report.violations {
                    println!("    [{}] {}", violation.position, violation.description);
                }
            }
        }
        Outcome::Failed { message, .. } => {
            let expected = match step.expected_error {
                Some(_) if step.matched => " (expected)".dimmed().to_string(),
                _ => String::new(),
            };
            println!("{mark} {head}: {}{expected}", message.yellow());
        }
    }
    if !step.matched {
        if let Some(expected) = step.expected_error {
            println!("    expected error {}", format!("{expected:?}").red());
        }
    }
}

fn format_statement(statement: &Statement) -> String {
    let kind = match statement.kind() {
        StatementKind::Deposit => statement.kind().as_str().green(),
        StatementKind::Withdraw => statement.kind().as_str().cyan(),
    };
    format!(
        "{} {} {} {}",
        statement.id().short_id().dimmed(),
        kind,
        statement.amount(),
        statement.description()
    )
}

fn print_race(race: &RaceReport) {
    println!(
        "Race on {}: opening {}, withdrawals {:?}",
        race.account.short_id().bold(),
        race.opening_balance,
        race.withdrawals
    );
    println!(
        "  accepted {}, rejected {}, final balance {}",
        race.accepted.to_string().green(),
        race.rejected.to_string().yellow(),
        race.final_balance.to_string().bold()
    );
}
