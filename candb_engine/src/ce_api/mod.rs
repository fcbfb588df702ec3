//! # CanDB engine public API
//!
//! The `ce_api` module exposes the programmatic API of the engine. Each API wraps a storage backend that implements the
//! backend traits it needs, so that clients can pick the pieces they want.
//!
//! * [`product_api`] manages products, their stock counters and availability maps, and answers stock checks.
//! * [`order_flow_api`] creates orders and places order lines, consulting the availability engine and reserving model
//!   stock as lines are placed.
//! * [`accounts_api`] manages user profiles and balances.
//! * [`auth_api`] verifies credentials and manages [`Role`](crate::db_types::Role)s.
//! * [`audit_api`] writes the audit trail, honouring the configured severity threshold.
//!
//! # API usage
//!
//! ```rust,ignore
//! use candb_engine::{availability::StockQuery, ProductApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/candb.db", 5).await?;
//! let api = ProductApi::new(db, AvailabilityEngine::default());
//! let result = api.check_stock(&product_id, &StockQuery::new(2)).await?;
//! ```
pub mod accounts_api;
pub mod audit_api;
pub mod audit_objects;
pub mod auth_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod product_api;
pub mod product_objects;
