use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("unknown statement kind: {0}")]
    UnknownKind(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}
