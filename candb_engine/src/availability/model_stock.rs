use crate::availability::{AvailabilityError, AvailabilityIndicator};

/// Availability straight from a product's own stock counters.
///
/// No physical stock count means the product is not stock-tracked, so supply is unlimited. A missing reserved count
/// next to a physical count is read as nothing reserved.
pub fn model_stock_available(
    physical_stock: Option<i64>,
    reserved_stock: Option<i64>,
) -> Result<AvailabilityIndicator, AvailabilityError> {
    match physical_stock {
        None => Ok(AvailabilityIndicator::Unlimited),
        Some(physical) => AvailabilityIndicator::from_counters(physical, reserved_stock.unwrap_or(0)),
    }
}
