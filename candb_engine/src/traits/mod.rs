//! # Database backend contracts
//!
//! The traits in this module define what a storage backend must provide to drive the CanDB engine APIs.
//!
//! * [`ProductManagement`] stores products, their model stock counters and availability maps.
//! * [`OrderManagement`] stores orders and order lines. Placing a line and releasing it are atomic with the stock
//!   reservation they carry.
//! * [`AccountManagement`] stores profiles and their balances.
//! * [`AuthManagement`] provides password hashes and role assignments.
//! * [`AuditLog`] persists the audit trail.
//!
//! [`CanDbDatabase`] bundles all of them; the SQLite backend implements it.
mod account_management;
mod audit_log;
mod auth_management;
mod candb_database;
mod order_management;
mod product_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use audit_log::{AuditLog, AuditLogError};
pub use auth_management::{AuthApiError, AuthManagement};
pub use candb_database::CanDbDatabase;
pub use order_management::{OrderFlowError, OrderManagement};
pub use product_management::{ProductApiError, ProductManagement};
