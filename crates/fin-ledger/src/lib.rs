//! Ledger core for the statement ledger.
//!
//! This crate decides whether a statement may be appended, derives balances
//! from history, and keeps concurrent requests on one account consistent.
//! It provides:
//! - [`Ledger`], generic over an [`AccountDirectory`] and a [`StatementStore`]
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - [`AccountLocks`], the per-account mutual exclusion map
//! - Balance projections (summary, running balances)
//! - History audit against the ledger invariants
//!
//! [`AccountDirectory`]: fin_store::AccountDirectory
//! [`StatementStore`]: fin_store::StatementStore

pub mod config;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod projection;
pub mod traits;
pub mod validation;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{next_created_at, Ledger};
pub use locks::{AccountGuard, AccountLocks};
pub use projection::{derive_balance, BalanceSummary, ProjectionBuilder, RunningBalance};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{HistoryValidator, ValidationReport, Violation, ViolationKind};
