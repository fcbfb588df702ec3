use std::{fmt::Display, str::FromStr};

use candb_common::Money;
use chrono::{DateTime, Utc};
use log::error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, Type};
use thiserror::Error;
use uuid::Uuid;

use crate::availability::{decode_availability, AvailabilityMap, StockContext, StockSource};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_NOTES_LENGTH: usize = 500;
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;
pub const MAX_PRODUCT_TAGS: usize = 64;
pub const MAX_TAG_LENGTH: usize = 64;
pub const MAX_PHONE_LENGTH: usize = 22;
/// Recorded on order lines placed before the deciding availability source was tracked.
pub const AVAILABILITY_NOT_RECORDED: i64 = -1;

//--------------------------------------   ValidationError     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("{field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("Price {0} is outside the allowed range")]
    PriceOutOfRange(Money),
    #[error("Invalid phone number '{0}'. Use the format +<country code>/<number>")]
    InvalidPhone(String),
    #[error("A product can carry at most {MAX_PRODUCT_TAGS} tags")]
    TooManyTags,
    #[error("Invalid stock counters: {0}")]
    StockInvariant(String),
    #[error("Reserved quantity {reserved} exceeds the ordered quantity {quantity}")]
    ReservedExceedsQuantity { reserved: i64, quantity: i64 },
    #[error("The cost of {quantity} units at {unit_cost} each is too large")]
    CostOverflow { quantity: i64, unit_cost: Money },
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        Err(ValidationError::TooLong { field, max })
    } else {
        Ok(())
    }
}

fn check_notes(notes: Option<&str>) -> Result<(), ValidationError> {
    notes.map(|n| check_length("notes", n, MAX_NOTES_LENGTH)).unwrap_or(Ok(()))
}

fn check_non_negative(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::Negative(field)),
        _ => Ok(()),
    }
}

/// Checks the product stock invariant: no reserved count without a physical count, and never more reserved than
/// physically held.
pub fn validate_stock_counters(physical: Option<i64>, reserved: Option<i64>) -> Result<(), ValidationError> {
    check_non_negative("physical stock", physical)?;
    check_non_negative("reserved stock", reserved)?;
    match (physical, reserved) {
        (None, Some(r)) => {
            Err(ValidationError::StockInvariant(format!("{r} units reserved, but physical stock is not tracked")))
        },
        (Some(p), Some(r)) if r > p => {
            Err(ValidationError::StockInvariant(format!("{r} units reserved, but only {p} physically held")))
        },
        _ => Ok(()),
    }
}

/// Phone numbers are written as `+<country code>/<number>`, e.g. `+61/412345678`.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidPhone(phone.to_string());
    if phone.len() > MAX_PHONE_LENGTH {
        return Err(invalid());
    }
    let re = Regex::new(r"^\+\d{1,5}/\d{3,15}$").map_err(|e| {
        error!("Phone number pattern failed to compile. {e}");
        invalid()
    })?;
    if re.is_match(phone) {
        Ok(())
    } else {
        Err(invalid())
    }
}

//--------------------------------------          Ids          ---------------------------------------------------------
macro_rules! prefixed_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new_random() -> Self {
                Self(format!("{}-{}", Self::PREFIX, Uuid::new_v4()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

prefixed_id!(ProductId, "PRODUCT");
prefixed_id!(OrderId, "ORDER");
prefixed_id!(OrderLineId, "ORDERLINE");

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Every profile has this role. It grants access to the profile's own data and to placing orders.
    User,
    /// Read access to all products, orders, profiles and the audit log.
    ReadAll,
    /// Write access to products, stock and other profiles' orders.
    Write,
    /// Everything, including role management and balance adjustments.
    SuperAdmin,
}

pub type Roles = Vec<Role>;

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::ReadAll => "read_all",
            Role::Write => "write",
            Role::SuperAdmin => "super_admin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "read_all" => Ok(Role::ReadAll),
            "write" => Ok(Role::Write),
            "super_admin" => Ok(Role::SuperAdmin),
            s => Err(RoleParseError(s.to_string())),
        }
    }
}

//--------------------------------------        Profile        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub balance: Money,
    pub admin_notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A profile to be inserted. The password must already be hashed.
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub admin_notes: Option<String>,
}

impl NewProfile {
    pub fn new<S: Into<String>>(username: S, password_hash: String) -> Self {
        Self { username: username.into(), password_hash, ..Default::default() }
    }

    pub fn with_name<S: Into<String>>(mut self, first: S, last: S) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Empty("username"));
        }
        check_length("username", &self.username, MAX_NAME_LENGTH)?;
        if let Some(name) = &self.first_name {
            check_length("first name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(name) = &self.last_name {
            check_length("last name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        check_notes(self.admin_notes.as_deref())
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub description: Option<String>,
    pub physical_stock: Option<i64>,
    pub reserved_stock: Option<i64>,
    pub availability: Option<AvailabilityMap>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockContext for Product {
    fn physical_stock(&self) -> Option<i64> {
        self.physical_stock
    }

    fn reserved_stock(&self) -> Option<i64> {
        self.reserved_stock
    }

    fn availability(&self) -> Option<&AvailabilityMap> {
        self.availability.as_ref()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let availability = row
            .try_get::<Option<String>, _>("availability")?
            .map(|text| decode_availability(&text))
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "availability".into(), source: Box::new(e) })?;
        let tags = row
            .try_get::<Option<String>, _>("tags")?
            .map(|text| serde_json::from_str::<Vec<String>>(&text))
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode { index: "tags".into(), source: Box::new(e) })?
            .unwrap_or_default();
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            description: row.try_get("description")?,
            physical_stock: row.try_get("physical_stock")?,
            reserved_stock: row.try_get("reserved_stock")?,
            availability,
            notes: row.try_get("notes")?,
            tags,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub physical_stock: Option<i64>,
    #[serde(default)]
    pub reserved_stock: Option<i64>,
    #[serde(default)]
    pub availability: Option<AvailabilityMap>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Money) -> Self {
        Self { name: name.into(), price, ..Default::default() }
    }

    pub fn with_stock(mut self, physical: i64, reserved: i64) -> Self {
        self.physical_stock = Some(physical);
        self.reserved_stock = Some(reserved);
        self
    }

    pub fn with_availability(mut self, availability: AvailabilityMap) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        check_length("name", &self.name, MAX_NAME_LENGTH)?;
        if !self.price.is_valid_price() {
            return Err(ValidationError::PriceOutOfRange(self.price));
        }
        if let Some(d) = &self.description {
            check_length("description", d, MAX_DESCRIPTION_LENGTH)?;
        }
        check_notes(self.notes.as_deref())?;
        validate_tags(&self.tags)?;
        validate_stock_counters(self.physical_stock, self.reserved_stock)
    }
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_PRODUCT_TAGS {
        return Err(ValidationError::TooManyTags);
    }
    tags.iter().try_for_each(|t| check_length("tag", t, MAX_TAG_LENGTH))
}

/// Descriptive fields of a product that can be edited after creation. Stock and availability have their own setters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ProductUpdate {
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.price.is_none() &&
            self.description.is_none() &&
            self.notes.is_none() &&
            self.tags.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::Empty("name"));
            }
            check_length("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(price) = self.price {
            if !price.is_valid_price() {
                return Err(ValidationError::PriceOutOfRange(price));
            }
        }
        if let Some(d) = &self.description {
            check_length("description", d, MAX_DESCRIPTION_LENGTH)?;
        }
        check_notes(self.notes.as_deref())?;
        self.tags.as_deref().map(validate_tags).unwrap_or(Ok(()))
    }
}

/// New values for a product's model stock counters. `None` in both fields means stock is not tracked (unlimited).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub physical_stock: Option<i64>,
    pub reserved_stock: Option<i64>,
}

impl StockLevels {
    pub fn untracked() -> Self {
        Self::default()
    }

    pub fn tracked(physical: i64, reserved: i64) -> Self {
        Self { physical_stock: Some(physical), reserved_stock: Some(reserved) }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_stock_counters(self.physical_stock, self.reserved_stock)
    }
}

//--------------------------------------    OrderLineStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderLineStatus {
    #[default]
    #[sqlx(rename = "P")]
    Pending,
    #[sqlx(rename = "O")]
    Open,
    #[sqlx(rename = "W")]
    WaitingForBalance,
    #[sqlx(rename = "C")]
    Confirmed,
    #[sqlx(rename = "I")]
    InProduction,
    #[sqlx(rename = "D")]
    Delivered,
    #[sqlx(rename = "R")]
    Returned,
    #[sqlx(rename = "X")]
    Cancelled,
    #[sqlx(rename = "L")]
    Locked,
    #[sqlx(rename = "S")]
    StandingByForStock,
}

impl OrderLineStatus {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Open => "O",
            Self::WaitingForBalance => "W",
            Self::Confirmed => "C",
            Self::InProduction => "I",
            Self::Delivered => "D",
            Self::Returned => "R",
            Self::Cancelled => "X",
            Self::Locked => "L",
            Self::StandingByForStock => "S",
        }
    }

    /// Lines in these states no longer hold stock.
    pub fn releases_stock(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned)
    }
}

impl Display for OrderLineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Open => "Open",
            Self::WaitingForBalance => "Waiting for balance",
            Self::Confirmed => "Confirmed",
            Self::InProduction => "In production",
            Self::Delivered => "Delivered",
            Self::Returned => "Returned",
            Self::Cancelled => "Cancelled",
            Self::Locked => "Locked",
            Self::StandingByForStock => "Standing by for stock",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order line status: {0}")]
pub struct StatusParseError(String);

impl FromStr for OrderLineStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" | "Pending" => Ok(Self::Pending),
            "O" | "Open" => Ok(Self::Open),
            "W" | "WaitingForBalance" => Ok(Self::WaitingForBalance),
            "C" | "Confirmed" => Ok(Self::Confirmed),
            "I" | "InProduction" => Ok(Self::InProduction),
            "D" | "Delivered" => Ok(Self::Delivered),
            "R" | "Returned" => Ok(Self::Returned),
            "X" | "Cancelled" => Ok(Self::Cancelled),
            "L" | "Locked" => Ok(Self::Locked),
            "S" | "StandingByForStock" => Ok(Self::StandingByForStock),
            s => Err(StatusParseError(s.to_string())),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub profile_id: i64,
    pub order_time: DateTime<Utc>,
    /// A manually agreed total. Stored as given.
    pub override_cost: Option<Money>,
    pub total_cost: Option<Money>,
    pub notes: Option<String>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    pub profile_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub override_cost: Option<Money>,
}

impl NewOrder {
    pub fn new(profile_id: i64) -> Self {
        Self { profile_id, ..Default::default() }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.override_cost.map(|c| c.is_negative()).unwrap_or(false) {
            return Err(ValidationError::Negative("override cost"));
        }
        check_notes(self.notes.as_deref())
    }
}

//--------------------------------------       OrderLine       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub quantity_reserved: i64,
    /// The unit price of the product when the line was placed.
    pub persistent_cost: Option<Money>,
    pub item_cost: Option<Money>,
    /// When set, the authoritative total for the line.
    pub force_price: Option<Money>,
    pub status: OrderLineStatus,
    pub notes: Option<String>,
    /// `NULL` when model stock decided, [`AVAILABILITY_NOT_RECORDED`] when unknown, otherwise the availability entry.
    pub availability_id: Option<i64>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderLine {
    /// The line total: the forced price if there is one, otherwise quantity times the unit price.
    pub fn calculate_item_cost(&self) -> Result<Option<Money>, ValidationError> {
        line_cost(self.quantity, self.persistent_cost, self.force_price)
    }

    /// The source that approved this line, if it was recorded.
    pub fn stock_source(&self) -> Option<StockSource> {
        match self.availability_id {
            None => Some(StockSource::ModelStock),
            Some(AVAILABILITY_NOT_RECORDED) => None,
            Some(id) => Some(StockSource::Configuration(id)),
        }
    }
}

pub fn line_cost(
    quantity: i64,
    persistent_cost: Option<Money>,
    force_price: Option<Money>,
) -> Result<Option<Money>, ValidationError> {
    match (force_price, persistent_cost) {
        (Some(price), _) => Ok(Some(price)),
        (None, Some(unit_cost)) => unit_cost
            .checked_mul(quantity)
            .map(Some)
            .ok_or(ValidationError::CostOverflow { quantity, unit_cost }),
        (None, None) => Ok(None),
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub quantity_reserved: i64,
    pub persistent_cost: Option<Money>,
    pub force_price: Option<Money>,
    pub notes: Option<String>,
    pub availability_id: Option<i64>,
}

impl NewOrderLine {
    pub fn new(order_id: OrderId, product_id: ProductId, quantity: i64) -> Self {
        Self {
            order_id,
            product_id,
            quantity,
            quantity_reserved: 0,
            persistent_cost: None,
            force_price: None,
            notes: None,
            availability_id: Some(AVAILABILITY_NOT_RECORDED),
        }
    }

    pub fn item_cost(&self) -> Result<Option<Money>, ValidationError> {
        line_cost(self.quantity, self.persistent_cost, self.force_price)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_negative("quantity", Some(self.quantity))?;
        check_non_negative("reserved quantity", Some(self.quantity_reserved))?;
        if self.quantity_reserved > self.quantity {
            return Err(ValidationError::ReservedExceedsQuantity {
                reserved: self.quantity_reserved,
                quantity: self.quantity,
            });
        }
        let negative = |m: Option<Money>| m.map(|m| m.is_negative()).unwrap_or(false);
        if negative(self.persistent_cost) {
            return Err(ValidationError::Negative("persistent cost"));
        }
        if negative(self.force_price) {
            return Err(ValidationError::Negative("forced price"));
        }
        if self.availability_id.map(|id| id < AVAILABILITY_NOT_RECORDED).unwrap_or(false) {
            return Err(ValidationError::Negative("availability id"));
        }
        let _ = self.item_cost()?;
        check_notes(self.notes.as_deref())
    }
}

//--------------------------------------       Audit log       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AuditLogType {
    #[sqlx(rename = "D")]
    Debug,
    #[sqlx(rename = "I")]
    Info,
    #[sqlx(rename = "W")]
    Warning,
    #[sqlx(rename = "E")]
    Error,
    #[sqlx(rename = "C")]
    Critical,
}

impl Display for AuditLogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[repr(i32)]
pub enum AuditEvent {
    ApiRequest = 0,
    Login = 1,
    DatabaseWrite = 2,
    DatabaseRead = 3,
    DatabaseDelete = 4,
    DatabaseEdit = 5,
    Exception = 6,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub log_type: AuditLogType,
    pub event: AuditEvent,
    pub message: String,
    pub profile_id: Option<i64>,
    pub origin: Option<String>,
    pub additional_data: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub log_type: AuditLogType,
    pub event: AuditEvent,
    pub message: String,
    pub profile_id: Option<i64>,
    pub origin: Option<String>,
    pub additional_data: Option<serde_json::Value>,
    /// 0 (exceptions) to 5 (everything). Entries without a severity are always recorded.
    pub severity: Option<u8>,
}

impl NewAuditEntry {
    pub fn new<S: Into<String>>(log_type: AuditLogType, event: AuditEvent, message: S) -> Self {
        Self {
            log_type,
            event,
            message: message.into(),
            profile_id: None,
            origin: None,
            additional_data: None,
            severity: None,
        }
    }

    pub fn with_severity(mut self, severity: u8) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Whether this entry passes a filter that keeps severities up to `max_severity`.
    pub fn passes(&self, max_severity: u8) -> bool {
        self.severity.map(|s| s <= max_severity).unwrap_or(true)
    }

    pub fn with_profile(mut self, profile_id: i64) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    pub fn with_origin<S: Into<String>>(mut self, origin: S) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.additional_data = Some(data);
        self
    }

    /// Message and origin are capped at the notes length. Longer values are cut rather than rejected so that an
    /// audit write never fails on content.
    pub fn truncated(mut self) -> Self {
        let cut = |s: &mut String| {
            if let Some((idx, _)) = s.char_indices().nth(MAX_NOTES_LENGTH) {
                s.truncate(idx);
            }
        };
        cut(&mut self.message);
        if let Some(origin) = self.origin.as_mut() {
            cut(origin);
        }
        self
    }
}
