use std::fmt::Display;

use candb_common::Money;
use candb_engine::{
    availability::AvailabilityMap,
    db_types::{OrderLineStatus, Role, StockLevels},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub profile_id: i64,
    pub roles: Vec<Role>,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfileRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Roles granted on top of `User`.
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub profile_id: i64,
    #[serde(default)]
    pub apply: Vec<Role>,
    #[serde(default)]
    pub revoke: Vec<Role>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AmountRequest {
    pub amount: Money,
}

/// A write against a versioned record. Without a `version`, the write applies to whatever the current version is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// `None` removes the map, so the product falls back to its model stock.
    #[serde(default)]
    pub availability: Option<AvailabilityMap>,
}

pub type StockRequest = StockLevels;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCheckParams {
    pub quantity: i64,
    /// Defaults to now, in the store's timezone.
    #[serde(default)]
    pub at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub search_until_found: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderRequest {
    /// Staff with the `Write` role may place orders for other profiles. Defaults to the caller.
    #[serde(default)]
    pub profile_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderLineStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForcePriceRequest {
    /// `None` clears the forced price.
    #[serde(default)]
    pub price: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
