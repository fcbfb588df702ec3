use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityError;

/// The outcome of resolving a stock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "quantity", rename_all = "snake_case")]
pub enum AvailabilityIndicator {
    /// Any quantity can be supplied.
    Unlimited,
    /// Nothing can be supplied.
    Unavailable,
    /// Exactly this many units can be supplied. Always positive; an exhausted count is `Unavailable`.
    Quantity(u64),
}

impl AvailabilityIndicator {
    /// Turns a pair of stock counters into an indicator.
    ///
    /// A zero difference is `Unavailable`. A negative difference means the counters are corrupt and is reported as
    /// [`AvailabilityError::NegativeStockInvariantViolation`] rather than being clamped.
    pub fn from_counters(physical: i64, reserved: i64) -> Result<Self, AvailabilityError> {
        match physical.saturating_sub(reserved) {
            d if d < 0 => Err(AvailabilityError::NegativeStockInvariantViolation { physical, reserved }),
            0 => Ok(Self::Unavailable),
            #[allow(clippy::cast_sign_loss)]
            d => Ok(Self::Quantity(d as u64)),
        }
    }
}

impl Display for AvailabilityIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Quantity(n) => write!(f, "{n} available"),
        }
    }
}

/// Returns true if `indicator` can cover `required` units.
pub fn compare_stock_quantity(required: u64, indicator: AvailabilityIndicator) -> bool {
    match indicator {
        AvailabilityIndicator::Unlimited => true,
        AvailabilityIndicator::Unavailable => false,
        AvailabilityIndicator::Quantity(n) => required <= n,
    }
}
