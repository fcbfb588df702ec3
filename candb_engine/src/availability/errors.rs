use thiserror::Error;

/// Failures raised while deciding whether a product can supply a quantity.
///
/// None of these are transient. The same input always produces the same error, so callers should not retry.
/// `InvalidQuantity` is a caller mistake; every other variant points at corrupt or inconsistent stored data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("Invalid quantity requested: {0}. Quantities must be non-negative.")]
    InvalidQuantity(i64),
    #[error("Invalid time selector: {0}")]
    InvalidSelectorKind(String),
    #[error("Availability configuration #{0} is referenced but does not exist")]
    UnknownAvailabilityReference(i64),
    #[error("Availability configuration references form a cycle: {0:?}")]
    CyclicReference(Vec<i64>),
    #[error("Stock counters are inconsistent. Physical stock ({physical}) is less than reserved stock ({reserved})")]
    NegativeStockInvariantViolation { physical: i64, reserved: i64 },
    #[error("No availability configuration applies at {0}")]
    NoTimerangeApplicable(String),
    #[error("Invalid availability configuration. {0}")]
    InvalidConfiguration(String),
    #[error("Could not decode availability configuration. {0}")]
    Codec(String),
}

impl AvailabilityError {
    /// True for errors that indicate bad stored configuration or counters, as opposed to a bad request.
    pub fn is_configuration_fault(&self) -> bool {
        !matches!(self, Self::InvalidQuantity(_))
    }
}
