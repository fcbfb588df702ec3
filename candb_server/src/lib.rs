//! # CanDB server
//!
//! The HTTP front end of the CanDB order-management service. It is responsible for:
//! * Authenticating users and issuing access tokens.
//! * Exposing the product catalogue, including stock levels, availability maps and stock checks.
//! * Accepting orders and order lines, and changing the status of order lines.
//! * Serving the audit log to staff.
//!
//! All the business rules live in `candb_engine`. The handlers here translate HTTP requests into engine calls and
//! engine errors into HTTP responses.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth`: Exchanges a username and password for an access token.
//! * `/api/...`: Everything else. These routes require a valid access token in the `candb_access_token` header.
//!   See [routes](routes/index.html) for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
