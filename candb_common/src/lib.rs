//! Shared primitives for the CanDB workspace: money amounts, redacted secrets and small env helpers.
pub mod helpers;
mod money;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, CURRENCY_CODE};
pub use secret::Secret;
