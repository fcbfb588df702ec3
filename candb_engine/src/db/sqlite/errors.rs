use thiserror::Error;

use crate::{
    availability::AvailabilityError,
    traits::{AccountApiError, AuditLogError, AuthApiError, OrderFlowError, ProductApiError},
};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Could not encode {0} for storage")]
    EncodingError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} was changed by another writer")]
    StaleVersion(String),
    #[error("{0}")]
    AvailabilityError(#[from] AvailabilityError),
}

impl From<SqliteDatabaseError> for ProductApiError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::AvailabilityError(e) => ProductApiError::AvailabilityError(e),
            SqliteDatabaseError::StaleVersion(id) => ProductApiError::StaleVersion(id.into()),
            SqliteDatabaseError::NotFound(id) => ProductApiError::ProductNotFound(id.into()),
            e => ProductApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for OrderFlowError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::AvailabilityError(e) => OrderFlowError::AvailabilityError(e),
            SqliteDatabaseError::StaleVersion(what) => OrderFlowError::StaleVersion(what),
            e => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for AccountApiError {
    fn from(e: SqliteDatabaseError) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

impl From<SqliteDatabaseError> for AuthApiError {
    fn from(e: SqliteDatabaseError) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

impl From<SqliteDatabaseError> for AuditLogError {
    fn from(e: SqliteDatabaseError) -> Self {
        AuditLogError::DatabaseError(e.to_string())
    }
}
