//! Foundation types for the statement ledger.
//!
//! Every other crate in the workspace depends on `fin-types`.
//!
//! # Key Types
//!
//! - [`AccountId`]: Opaque account identity, owned by the account directory
//! - [`StatementId`]: UUID v7 statement identifier, unique across the store
//! - [`StatementKind`]: Closed set of ledger events (`deposit`, `withdraw`)
//! - [`Amount`]: Strictly positive quantity in minor currency units
//! - [`Statement`]: One immutable ledger record

pub mod amount;
pub mod error;
pub mod identity;
pub mod statement;

pub use amount::{Amount, Balance};
pub use error::TypeError;
pub use identity::{AccountId, StatementId};
pub use statement::{Statement, StatementKind};
