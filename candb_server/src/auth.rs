//! Access tokens
//!
//! `POST /auth` exchanges a username and password for a signed JWT. Every request under `/api` must carry that token in
//! the [`ACCESS_TOKEN_HEADER`] header. The authentication middleware validates it and stores the [`JwtClaims`] in the
//! request extensions, where handlers pick them up by taking a `JwtClaims` argument.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use candb_engine::db_types::{Role, Roles};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "candb_access_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The profile id
    pub sub: i64,
    pub username: String,
    pub roles: Roles,
    pub exp: i64,
}

impl JwtClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// True if the token belongs to `profile_id`, or carries `role`.
    pub fn is_owner_or(&self, profile_id: i64, role: Role) -> bool {
        self.sub == profile_id || self.has_role(role)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or_else(|| {
            warn!("🔐️ No JWT claims in request extensions. Is the route behind the authentication middleware?");
            ServerError::AuthenticationError(AuthError::MissingToken)
        }))
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
    expiry_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, expiry_secs: config.token_expiry_secs }
    }

    /// Issue a new access token for the given profile.
    /// This method DOES NOT check the credentials. That must be done prior to calling `issue_token`.
    pub fn issue_token(&self, profile_id: i64, username: &str, roles: Roles) -> Result<String, AuthError> {
        let claims = JwtClaims {
            sub: profile_id,
            username: username.to_string(),
            roles,
            exp: Utc::now().timestamp() + self.expiry_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| AuthError::TokenNotIssued(e.to_string()))
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        // `sub` is the numeric profile id, which jsonwebtoken never counts as present. Deserialization requires it.
        validation.set_required_spec_claims(&["exp"]);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("🔐️ Access token rejected. {e}");
            AuthError::InvalidToken(e.to_string())
        })?;
        Ok(data.claims)
    }
}
