use thiserror::Error;

use crate::db_types::Role;

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Profile #{0} does not exist")]
    ProfileNotFound(i64),
    #[error("Profile lacks {0} of the required roles")]
    RoleNotAllowed(usize),
    #[error("The requested role does not exist")]
    RoleNotFound,
    #[error("The password is too weak: {0}")]
    WeakPassword(String),
    #[error("Could not hash password. {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// The profile id and stored password hash for `username`, if the profile exists.
    async fn fetch_credentials(&self, username: &str) -> Result<Option<(i64, String)>, AuthApiError>;

    async fn fetch_roles_for_profile(&self, profile_id: i64) -> Result<Vec<Role>, AuthApiError>;

    /// Succeeds if the profile holds every role in `roles`, otherwise fails with [`AuthApiError::RoleNotAllowed`].
    async fn check_profile_has_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    async fn assign_roles(&self, profile_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    /// Returns the number of assignments removed.
    async fn remove_roles(&self, profile_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;
}
