use std::{collections::HashSet, fmt::Display};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::availability::{
    compare_stock_quantity,
    model_stock_available,
    resolve,
    AvailabilityError,
    AvailabilityIndicator,
    StockConfig,
    TimeSelector,
};

//--------------------------------------   AvailabilityEntry   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityEntry {
    pub id: i64,
    pub selector: TimeSelector,
    pub config: StockConfig,
}

impl AvailabilityEntry {
    pub fn new(id: i64, selector: TimeSelector, config: StockConfig) -> Self {
        Self { id, selector, config }
    }
}

//--------------------------------------    AvailabilityMap    ---------------------------------------------------------
/// A product's availability configuration: an ordered list of entries.
///
/// Order is priority. When more than one timed entry applies at an instant, the one that comes first wins (unless the
/// caller asks the engine to keep searching). Maps decoded from storage are ordered by ascending ID.
///
/// A map never holds duplicate IDs, more than one default entry, or malformed selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMap {
    entries: Vec<AvailabilityEntry>,
}

impl AvailabilityMap {
    pub fn new(entries: Vec<AvailabilityEntry>) -> Result<Self, AvailabilityError> {
        let mut ids = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !ids.insert(entry.id) {
                return Err(AvailabilityError::InvalidConfiguration(format!("duplicate entry id #{}", entry.id)));
            }
            entry.selector.validate()?;
        }
        let defaults = entries.iter().filter(|e| e.selector.is_default()).count();
        if defaults > 1 {
            return Err(AvailabilityError::InvalidConfiguration(format!(
                "{defaults} default entries were given, but at most one is allowed"
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AvailabilityEntry] {
        &self.entries
    }

    pub fn get(&self, id: i64) -> Option<&AvailabilityEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn default_entry(&self) -> Option<&AvailabilityEntry> {
        self.entries.iter().find(|e| e.selector.is_default())
    }

    /// Entries with a time window, in priority order.
    pub fn timed_entries(&self) -> impl Iterator<Item = &AvailabilityEntry> {
        self.entries.iter().filter(|e| !e.selector.is_default())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//--------------------------------------      StockContext     ---------------------------------------------------------
/// Read-only view of the stock data the engine needs from a product.
pub trait StockContext {
    fn physical_stock(&self) -> Option<i64>;
    fn reserved_stock(&self) -> Option<i64>;
    fn availability(&self) -> Option<&AvailabilityMap>;
}

//--------------------------------------      StockDecision    ---------------------------------------------------------
/// Where an availability decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockSource {
    /// The product's own stock counters; there is no availability map.
    ModelStock,
    /// The availability entry with this ID.
    Configuration(i64),
}

impl StockSource {
    /// The value recorded against an order line: `None` for model stock, otherwise the entry ID.
    pub fn availability_id(&self) -> Option<i64> {
        match self {
            Self::ModelStock => None,
            Self::Configuration(id) => Some(*id),
        }
    }
}

impl Display for StockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelStock => write!(f, "model stock"),
            Self::Configuration(id) => write!(f, "availability entry #{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecision {
    pub available: bool,
    /// The source that made the decision. When every candidate was tried and none could cover the request, this is
    /// the last one tried.
    pub source: StockSource,
    pub indicator: AvailabilityIndicator,
}

//--------------------------------------       StockQuery      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuery {
    pub quantity: i64,
    /// When omitted, the engine uses the current time in the store's timezone.
    #[serde(default)]
    pub at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub search_until_found: bool,
}

impl StockQuery {
    pub fn new(quantity: i64) -> Self {
        Self { quantity, at: None, search_until_found: false }
    }

    pub fn at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.at = Some(at);
        self
    }

    pub fn search_until_found(mut self) -> Self {
        self.search_until_found = true;
        self
    }
}

//--------------------------------------   Stock evaluation    ---------------------------------------------------------

/// Decides whether `ctx` can supply `quantity` units at `at`, and reports which source decided.
///
/// * Without an availability map, the product's model stock decides.
/// * Otherwise the timed entries whose window contains `at` are candidates, in map order, followed by the default
///   entry if there is one. With no candidates at all the result is [`AvailabilityError::NoTimerangeApplicable`].
/// * When `search_until_found` is false, the first candidate is authoritative: its answer is returned even if a later
///   candidate has more stock. Otherwise candidates are tried in turn until one can cover the request.
pub fn evaluate_stock<C>(
    ctx: &C,
    quantity: i64,
    at: &DateTime<FixedOffset>,
    search_until_found: bool,
) -> Result<StockDecision, AvailabilityError>
where
    C: StockContext + ?Sized,
{
    let required = u64::try_from(quantity).map_err(|_| AvailabilityError::InvalidQuantity(quantity))?;
    let Some(map) = ctx.availability() else {
        let indicator = model_stock_available(ctx.physical_stock(), ctx.reserved_stock())?;
        let available = compare_stock_quantity(required, indicator);
        trace!("📦️ No availability map. Model stock is {indicator}");
        return Ok(StockDecision { available, source: StockSource::ModelStock, indicator });
    };
    let mut candidates = Vec::with_capacity(map.len());
    for entry in map.timed_entries() {
        if entry.selector.matches(at)? {
            candidates.push(entry);
        }
    }
    candidates.extend(map.default_entry());
    if candidates.is_empty() {
        debug!("📦️ None of the {} availability entries apply at {at}", map.len());
        return Err(AvailabilityError::NoTimerangeApplicable(at.to_rfc3339()));
    }
    let mut decision = None;
    for entry in candidates {
        let indicator = resolve(ctx, entry.id, &entry.config)?;
        let available = compare_stock_quantity(required, indicator);
        trace!("📦️ Availability entry #{} ({}) is {indicator}. {quantity} requested", entry.id, entry.selector);
        let current = StockDecision { available, source: StockSource::Configuration(entry.id), indicator };
        if available || !search_until_found {
            return Ok(current);
        }
        decision = Some(current);
    }
    // The candidate list is non-empty, so at least one decision was recorded
    decision.ok_or_else(|| AvailabilityError::NoTimerangeApplicable(at.to_rfc3339()))
}

/// Returns true if `ctx` can supply `quantity` units at `at`. See [`evaluate_stock`] for the rules.
pub fn check_stock<C>(
    ctx: &C,
    quantity: i64,
    at: &DateTime<FixedOffset>,
    search_until_found: bool,
) -> Result<bool, AvailabilityError>
where
    C: StockContext + ?Sized,
{
    evaluate_stock(ctx, quantity, at, search_until_found).map(|d| d.available)
}

//--------------------------------------  AvailabilityEngine   ---------------------------------------------------------
/// Stateless front for stock checks that knows the store's timezone. Date and weekday windows are evaluated in this
/// timezone when the query does not carry its own time.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityEngine {
    timezone: FixedOffset,
}

impl Default for AvailabilityEngine {
    fn default() -> Self {
        Self { timezone: Utc.fix() }
    }
}

impl AvailabilityEngine {
    pub fn new(timezone: FixedOffset) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub fn evaluate<C>(&self, ctx: &C, query: &StockQuery) -> Result<StockDecision, AvailabilityError>
    where C: StockContext + ?Sized {
        let at = query.at.unwrap_or_else(|| self.now());
        evaluate_stock(ctx, query.quantity, &at, query.search_until_found)
    }

    pub fn check_stock<C>(&self, ctx: &C, query: &StockQuery) -> Result<bool, AvailabilityError>
    where C: StockContext + ?Sized {
        self.evaluate(ctx, query).map(|d| d.available)
    }
}
