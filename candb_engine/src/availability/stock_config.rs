use log::trace;
use serde::{Deserialize, Serialize};

use crate::availability::{model_stock_available, AvailabilityError, AvailabilityIndicator, StockContext};

/// The stock rule attached to one availability entry.
///
/// Fields are consulted in a fixed order and the first one that applies decides the outcome:
/// `available`, `reference`, `useModelStock`, `infinite`, then `physicalStock - reservedStock`. Fields further down
/// the list are ignored once an earlier one fires, even when they contradict it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockConfig {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_model_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infinite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_stock: Option<i64>,
}

impl StockConfig {
    pub fn unavailable() -> Self {
        Self { available: false, ..Default::default() }
    }

    pub fn infinite() -> Self {
        Self { available: true, infinite: Some(true), ..Default::default() }
    }

    pub fn model_stock() -> Self {
        Self { available: true, use_model_stock: Some(true), ..Default::default() }
    }

    pub fn reference(id: i64) -> Self {
        Self { available: true, reference: Some(id), ..Default::default() }
    }

    pub fn counted(physical_stock: i64, reserved_stock: i64) -> Self {
        Self {
            available: true,
            physical_stock: Some(physical_stock),
            reserved_stock: Some(reserved_stock),
            ..Default::default()
        }
    }
}

/// Resolves `config`, which belongs to availability entry `entry_id`, into an availability indicator.
///
/// References are followed through the context's availability map. The IDs seen so far are tracked, and revisiting
/// one fails with [`AvailabilityError::CyclicReference`] carrying the chain. A reference to an ID missing from the map
/// fails with [`AvailabilityError::UnknownAvailabilityReference`].
pub fn resolve<C>(ctx: &C, entry_id: i64, config: &StockConfig) -> Result<AvailabilityIndicator, AvailabilityError>
where C: StockContext + ?Sized {
    let mut visited = vec![entry_id];
    let mut current = config;
    loop {
        if !current.available {
            return Ok(AvailabilityIndicator::Unavailable);
        }
        if let Some(target) = current.reference {
            if visited.contains(&target) {
                visited.push(target);
                return Err(AvailabilityError::CyclicReference(visited));
            }
            let entry = ctx
                .availability()
                .and_then(|map| map.get(target))
                .ok_or(AvailabilityError::UnknownAvailabilityReference(target))?;
            trace!("📦️ Availability entry #{} defers to #{target}", visited[visited.len() - 1]);
            visited.push(target);
            current = &entry.config;
            continue;
        }
        if current.use_model_stock == Some(true) {
            return model_stock_available(ctx.physical_stock(), ctx.reserved_stock());
        }
        if current.infinite == Some(true) {
            return Ok(AvailabilityIndicator::Unlimited);
        }
        return match (current.physical_stock, current.reserved_stock) {
            (Some(physical), Some(reserved)) => AvailabilityIndicator::from_counters(physical, reserved),
            _ => Err(AvailabilityError::InvalidConfiguration(format!(
                "entry #{} needs both physicalStock and reservedStock when no other rule applies",
                visited[visited.len() - 1]
            ))),
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::availability::{
        test_support::Stock,
        AvailabilityEntry,
        AvailabilityIndicator::*,
        AvailabilityMap,
        TimeSelector,
    };

    fn entry(id: i64, config: StockConfig) -> AvailabilityEntry {
        AvailabilityEntry::new(id, TimeSelector::WeekdayRange(0, 6), config)
    }

    fn stock_with(entries: Vec<AvailabilityEntry>) -> Stock {
        Stock::tracked(20, 5).with_availability(AvailabilityMap::new(entries).unwrap())
    }

    #[test]
    fn unavailable_wins_over_everything() {
        let stock = Stock::untracked();
        let config = StockConfig {
            available: false,
            reference: Some(99),
            use_model_stock: Some(true),
            infinite: Some(true),
            physical_stock: Some(100),
            reserved_stock: Some(0),
        };
        assert_eq!(resolve(&stock, 1, &config).unwrap(), Unavailable);
    }

    #[test]
    fn model_stock_comes_before_infinite() {
        let stock = Stock::tracked(10, 10);
        let config = StockConfig { infinite: Some(true), ..StockConfig::model_stock() };
        assert_eq!(resolve(&stock, 1, &config).unwrap(), Unavailable);
        let stock = Stock::tracked(10, 4);
        assert_eq!(resolve(&stock, 1, &config).unwrap(), Quantity(6));
    }

    #[test]
    fn infinite_comes_before_counters() {
        let config = StockConfig { physical_stock: Some(1), reserved_stock: Some(5), ..StockConfig::infinite() };
        assert_eq!(resolve(&Stock::untracked(), 1, &config).unwrap(), Unlimited);
    }

    #[test]
    fn counters() {
        let stock = Stock::untracked();
        assert_eq!(resolve(&stock, 1, &StockConfig::counted(8, 3)).unwrap(), Quantity(5));
        assert_eq!(resolve(&stock, 1, &StockConfig::counted(0, 0)).unwrap(), Unavailable);
        assert_eq!(
            resolve(&stock, 1, &StockConfig::counted(1, 3)).unwrap_err(),
            AvailabilityError::NegativeStockInvariantViolation { physical: 1, reserved: 3 }
        );
    }

    #[test]
    fn missing_counters_are_a_configuration_error() {
        let config = StockConfig { available: true, physical_stock: Some(5), ..Default::default() };
        assert!(matches!(resolve(&Stock::untracked(), 1, &config), Err(AvailabilityError::InvalidConfiguration(_))));
    }

    #[test]
    fn references_resolve_to_their_target() {
        let stock = stock_with(vec![
            entry(1, StockConfig::reference(2)),
            entry(2, StockConfig::reference(3)),
            entry(3, StockConfig::counted(12, 2)),
            entry(4, StockConfig::model_stock()),
            entry(5, StockConfig::reference(4)),
        ]);
        let map = stock.availability.clone().unwrap();
        for id in 1..=5 {
            let config = &map.get(id).unwrap().config;
            let target = match id {
                1..=3 => 3,
                _ => 4,
            };
            let expected = resolve(&stock, target, &map.get(target).unwrap().config).unwrap();
            assert_eq!(resolve(&stock, id, config).unwrap(), expected, "entry #{id}");
        }
        assert_eq!(resolve(&stock, 1, &map.get(1).unwrap().config).unwrap(), Quantity(10));
        assert_eq!(resolve(&stock, 5, &map.get(5).unwrap().config).unwrap(), Quantity(15));
    }

    #[test]
    fn reference_ignores_the_rest_of_the_entry() {
        let stock = stock_with(vec![entry(1, StockConfig::unavailable())]);
        let config = StockConfig { infinite: Some(true), ..StockConfig::reference(1) };
        assert_eq!(resolve(&stock, 7, &config).unwrap(), Unavailable);
    }

    #[test]
    fn unknown_reference() {
        let stock = stock_with(vec![entry(1, StockConfig::reference(42))]);
        let config = StockConfig::reference(42);
        assert_eq!(resolve(&stock, 1, &config).unwrap_err(), AvailabilityError::UnknownAvailabilityReference(42));
        // without any availability map there is nothing to refer to
        assert_eq!(
            resolve(&Stock::untracked(), 1, &config).unwrap_err(),
            AvailabilityError::UnknownAvailabilityReference(42)
        );
    }

    #[test]
    fn cyclic_references() {
        let stock = stock_with(vec![
            entry(1, StockConfig::reference(2)),
            entry(2, StockConfig::reference(3)),
            entry(3, StockConfig::reference(1)),
            entry(4, StockConfig::reference(4)),
        ]);
        let map = stock.availability.clone().unwrap();
        assert_eq!(
            resolve(&stock, 1, &map.get(1).unwrap().config).unwrap_err(),
            AvailabilityError::CyclicReference(vec![1, 2, 3, 1])
        );
        assert_eq!(
            resolve(&stock, 4, &map.get(4).unwrap().config).unwrap_err(),
            AvailabilityError::CyclicReference(vec![4, 4])
        );
    }

    #[test]
    fn stored_field_names() {
        let config: StockConfig = serde_json::from_str(
            r#"{"available": true, "useModelStock": false, "physicalStock": 4, "reservedStock": 1}"#,
        )
        .unwrap();
        assert_eq!(config, StockConfig { use_model_stock: Some(false), ..StockConfig::counted(4, 1) });
        assert!(serde_json::from_str::<StockConfig>(r#"{"infinite": true}"#).is_err());
        let json = serde_json::to_string(&StockConfig::model_stock()).unwrap();
        assert_eq!(json, r#"{"available":true,"useModelStock":true}"#);
    }
}
