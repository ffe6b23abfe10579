//! Collaborator contracts consumed by the ledger core.
//!
//! The ledger never owns accounts or storage. It talks to two narrow
//! interfaces:
//!
//! - [`AccountDirectory`] -- answers whether an account exists
//! - [`StatementStore`] -- append-only statement log, indexed by account and id
//!
//! # Backends
//!
//! - [`InMemoryAccountDirectory`] -- `HashSet`-based directory for tests and embedding
//! - [`InMemoryStatementStore`] -- `Vec`-based log with account and id indexes
//!
//! # Design Rules
//!
//! 1. Statements are immutable once appended; there is no update or delete.
//! 2. Appends are atomic: a statement is either fully visible or not at all.
//! 3. `list_by_account` returns statements in append order.
//! 4. Statement ids are unique across the whole store.
//! 5. All backend errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryAccountDirectory, InMemoryStatementStore};
pub use traits::{AccountDirectory, StatementStore};
