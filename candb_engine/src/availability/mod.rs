//! # Product availability
//!
//! Decides whether a product can supply a requested quantity at a given instant.
//!
//! A product either relies on its own stock counters ("model stock") or carries an [`AvailabilityMap`]: an ordered list
//! of entries, each pairing a [`TimeSelector`] (a date-time window, a date window, a weekday window or the default
//! fallback) with a [`StockConfig`]. At query time the engine picks the entries whose window contains the instant,
//! resolves their stock configuration to an [`AvailabilityIndicator`] and compares it with the requested quantity.
//!
//! Everything here is pure and synchronous. Nothing in this module touches stock counters; reserving stock when an
//! order line is placed is done by the order flow in a database transaction.
//!
//! ```rust,ignore
//! use candb_engine::availability::{check_stock, StockQuery, AvailabilityEngine};
//! let engine = AvailabilityEngine::new(store_timezone);
//! let can_supply = engine.check_stock(&product, &StockQuery::new(3).search_until_found())?;
//! ```
mod codec;
mod engine;
mod errors;
mod indicator;
mod model_stock;
mod selector;
mod stock_config;

pub use codec::{availability_from_json, availability_to_json, decode_availability, encode_availability};
pub use engine::{
    check_stock,
    evaluate_stock,
    AvailabilityEngine,
    AvailabilityEntry,
    AvailabilityMap,
    StockContext,
    StockDecision,
    StockQuery,
    StockSource,
};
pub use errors::AvailabilityError;
pub use indicator::{compare_stock_quantity, AvailabilityIndicator};
pub use model_stock::model_stock_available;
pub use selector::{TimeSelector, MAX_WEEKDAY};
pub use stock_config::{resolve, StockConfig};
