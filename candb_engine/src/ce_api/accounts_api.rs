//! Profiles and balances.

use std::fmt::Debug;

use candb_common::Money;
use log::*;

use crate::{
    db_types::{NewProfile, Profile},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` provides a unified API for accessing user profiles.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_profile(&self, profile: NewProfile) -> Result<Profile, AccountApiError> {
        let profile = self.db.insert_profile(profile).await?;
        info!("👤️ Profile #{} ({}) created", profile.id, profile.username);
        Ok(profile)
    }

    /// Fetches the profile with the given id. If no profile exists, `None` is returned.
    pub async fn profile_by_id(&self, id: i64) -> Result<Option<Profile>, AccountApiError> {
        self.db.fetch_profile(id).await
    }

    pub async fn profile_by_username(&self, username: &str) -> Result<Option<Profile>, AccountApiError> {
        self.db.fetch_profile_by_username(username).await
    }

    pub async fn profiles(&self) -> Result<Vec<Profile>, AccountApiError> {
        self.db.fetch_profiles().await
    }

    /// Adds `amount` to the profile's balance.
    pub async fn credit_balance(&self, id: i64, amount: Money) -> Result<Profile, AccountApiError> {
        if amount.is_negative() {
            return Err(AccountApiError::InvalidAmount(amount));
        }
        let profile = self.db.adjust_balance(id, amount).await?;
        debug!("👤️ Credited {amount} to profile #{id}. Balance is now {}", profile.balance);
        Ok(profile)
    }

    /// Takes `amount` from the profile's balance. Fails with [`AccountApiError::InsufficientFunds`] if the balance does
    /// not cover it.
    pub async fn debit_balance(&self, id: i64, amount: Money) -> Result<Profile, AccountApiError> {
        if amount.is_negative() {
            return Err(AccountApiError::InvalidAmount(amount));
        }
        let profile = self.db.adjust_balance(id, -amount).await?;
        debug!("👤️ Debited {amount} from profile #{id}. Balance is now {}", profile.balance);
        Ok(profile)
    }
}
