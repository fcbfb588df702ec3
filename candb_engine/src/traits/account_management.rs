use candb_common::Money;
use thiserror::Error;

use crate::db_types::{NewProfile, Profile, ValidationError};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Profile #{0} does not exist")]
    ProfileNotFound(i64),
    #[error("Profile #{0} was modified by someone else. Try again.")]
    StaleVersion(i64),
    #[error("The username {0} is already taken")]
    UsernameTaken(String),
    #[error("Amounts must be positive, but {0} was given")]
    InvalidAmount(Money),
    #[error("Insufficient funds. The balance is {balance}, but {requested} was requested")]
    InsufficientFunds { balance: Money, requested: Money },
    #[error("Invalid profile data. {0}")]
    ValidationError(#[from] ValidationError),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Storage for user profiles and their balances.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates the profile and grants it the `User` role.
    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, AccountApiError>;

    async fn fetch_profile(&self, id: i64) -> Result<Option<Profile>, AccountApiError>;

    async fn fetch_profile_by_username(&self, username: &str) -> Result<Option<Profile>, AccountApiError>;

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, AccountApiError>;

    /// Adds `delta` (which may be negative) to the profile's balance atomically. The balance never drops below zero;
    /// a change that would do so fails with [`AccountApiError::InsufficientFunds`].
    async fn adjust_balance(&self, id: i64, delta: Money) -> Result<Profile, AccountApiError>;
}
