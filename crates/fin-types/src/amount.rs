use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Signed account balance in minor currency units.
///
/// Wide enough that summing any number of [`Amount`]s cannot overflow.
pub type Balance = i128;

/// Strictly positive quantity in the account's minor currency unit.
///
/// Zero and negative values are rejected at construction, including when
/// deserializing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, TypeError> {
        if value <= 0 {
            return Err(TypeError::NonPositiveAmount(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// The amount widened to a [`Balance`].
    pub fn as_balance(self) -> Balance {
        Balance::from(self.0)
    }
}

impl TryFrom<i64> for Amount {
    type Error = TypeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
