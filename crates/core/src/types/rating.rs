//! Star rating a user gives a dish.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rate must be between {min} and {max} (got {got})", min = Rate::MIN, max = Rate::MAX)]
pub struct RateError {
    pub got: i64,
}

/// A rating from 1 to 5 stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Rate(i16);

impl Rate {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    /// # Errors
    ///
    /// Returns `RateError` when `value` is outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, RateError> {
        i16::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RateError { got: value })
    }

    #[must_use]
    pub const fn value(&self) -> i16 {
        self.0
    }
}

impl TryFrom<i64> for Rate {
    type Error = RateError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rate> for i16 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}
