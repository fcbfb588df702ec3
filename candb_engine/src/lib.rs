//! CanDB engine
//!
//! The engine behind the CanDB order-management service. It decides whether products can be supplied, keeps the
//! product catalogue, and records orders placed against it.
//!
//! The library is divided into these sections:
//! 1. The availability engine ([`mod@availability`]). Given a product's stock counters and availability map, it decides
//!    whether a quantity can be supplied at an instant. It is pure and synchronous.
//! 2. Database management and control (`db`). SQLite is the supported backend. You should never need to access the
//!    database directly. The exception is the data types stored in it, which live in [`mod@db_types`].
//! 3. The engine's public API (`ce_api`). [`ProductApi`], [`OrderFlowApi`], [`AccountApi`], [`AuthApi`] and
//!    [`AuditApi`] wrap a backend that implements the traits in [`mod@traits`].
//!
//! The engine also emits events when orders are created and order lines change. See [`mod@events`].
pub mod availability;
mod ce_api;
mod db;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ce_api::{
    accounts_api::AccountApi,
    audit_api::{AuditApi, MAX_AUDIT_SEVERITY},
    audit_objects,
    auth_api::{self, AuthApi},
    order_flow_api::OrderFlowApi,
    order_objects,
    product_api::ProductApi,
    product_objects,
};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use traits::{
    AccountApiError,
    AccountManagement,
    AuditLog,
    AuditLogError,
    AuthApiError,
    AuthManagement,
    CanDbDatabase,
    OrderFlowError,
    OrderManagement,
    ProductApiError,
    ProductManagement,
};
