use std::fmt::Display;

use candb_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    availability::{AvailabilityIndicator, StockSource},
    db_types::ProductId,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductQueryFilter {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    pub tag: Option<String>,
    pub max_price: Option<Money>,
}

impl ProductQueryFilter {
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.tag.is_none() && self.max_price.is_none()
    }
}

impl Display for ProductQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(name) = &self.name {
            write!(f, "name like '{name}'. ")?;
        }
        if let Some(tag) = &self.tag {
            write!(f, "tag: {tag}. ")?;
        }
        if let Some(price) = &self.max_price {
            write!(f, "price <= {price}. ")?;
        }
        Ok(())
    }
}

/// The answer to a stock check, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheckResult {
    pub product_id: ProductId,
    pub quantity: i64,
    pub available: bool,
    pub source: StockSource,
    pub indicator: AvailabilityIndicator,
}
