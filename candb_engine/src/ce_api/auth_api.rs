use std::fmt::Debug;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
};
use log::*;

use crate::{
    db_types::Role,
    traits::{AuthApiError, AuthManagement},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Profiles holding these roles need a password that passes [`check_password_strength`].
pub const ELEVATED_ROLES: [Role; 2] = [Role::Write, Role::SuperAdmin];

pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

/// Hashes a password with argon2 and a random salt. The result is a PHC string that carries its own parameters.
pub fn hash_password(password: &str) -> Result<String, AuthApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!("🔐️ Stored password hash could not be parsed. {e}");
            false
        },
    }
}

/// Staff passwords must be at least [`MIN_PASSWORD_LENGTH`] characters and mix upper case, lower case and digits.
pub fn check_password_strength(password: &str) -> Result<(), AuthApiError> {
    let weak = |reason: &str| Err(AuthApiError::WeakPassword(reason.to_string()));
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return weak("it is too short");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return weak("it has no upper case letters");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return weak("it has no lower case letters");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return weak("it has no digits");
    }
    Ok(())
}

/// Checks a new password against the roles its profile will hold.
pub fn validate_password(password: &str, roles: &[Role]) -> Result<(), AuthApiError> {
    if password.is_empty() {
        return Err(AuthApiError::WeakPassword("it is empty".to_string()));
    }
    if roles.iter().any(|r| ELEVATED_ROLES.contains(r)) {
        check_password_strength(password)?;
    }
    Ok(())
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    /// Checks a username and password. On success, returns the profile id and its roles.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(i64, Vec<Role>), AuthApiError> {
        let Some((profile_id, hash)) = self.db.fetch_credentials(username).await? else {
            debug!("🔐️ Login attempt for unknown user {username}");
            return Err(AuthApiError::InvalidCredentials);
        };
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await.unwrap_or(false);
        if !valid {
            debug!("🔐️ Wrong password for {username}");
            return Err(AuthApiError::InvalidCredentials);
        }
        let roles = self.db.fetch_roles_for_profile(profile_id).await?;
        info!("🔐️ {username} authenticated with roles {roles:?}");
        Ok((profile_id, roles))
    }

    pub async fn roles_for_profile(&self, profile_id: i64) -> Result<Vec<Role>, AuthApiError> {
        self.db.fetch_roles_for_profile(profile_id).await
    }

    pub async fn check_profile_has_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        self.db.check_profile_has_roles(profile_id, roles).await
    }

    pub async fn assign_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        self.db.assign_roles(profile_id, roles).await?;
        info!("🔐️ Profile #{profile_id} granted {roles:?}");
        Ok(())
    }

    /// The `User` role cannot be removed.
    pub async fn remove_roles(&self, profile_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        let roles = roles.iter().copied().filter(|r| *r != Role::User).collect::<Vec<_>>();
        let removed = self.db.remove_roles(profile_id, &roles).await?;
        info!("🔐️ {removed} roles removed from profile #{profile_id}");
        Ok(removed)
    }
}
