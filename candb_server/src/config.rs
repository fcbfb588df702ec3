use std::env;

use candb_common::{helpers::env_flag, Secret};
use candb_engine::MAX_AUDIT_SEVERITY;
use chrono::{FixedOffset, Offset, Utc};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_CANDB_HOST: &str = "127.0.0.1";
const DEFAULT_CANDB_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/candb.db";
const DEFAULT_JWT_EXPIRY_SECS: i64 = 60 * 60 * 24;
const DEFAULT_AUDIT_MAX_SEVERITY: u8 = MAX_AUDIT_SEVERITY;
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// The store's timezone. Stock checks without an explicit time are made at the current time in this zone.
    pub timezone: FixedOffset,
    /// Audit entries with a severity above this value are not recorded. 5 records everything.
    pub audit_max_severity: u8,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CANDB_HOST.to_string(),
            port: DEFAULT_CANDB_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            timezone: utc(),
            audit_max_severity: DEFAULT_AUDIT_MAX_SEVERITY,
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CANDB_HOST").ok().unwrap_or_else(|| DEFAULT_CANDB_HOST.into());
        let port = env::var("CANDB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CANDB_PORT. {e} Using the default, {DEFAULT_CANDB_PORT}, \
                         instead."
                    );
                    DEFAULT_CANDB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CANDB_PORT);
        let database_url = env::var("CANDB_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CANDB_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let timezone = match env::var("CANDB_TIMEZONE") {
            Ok(s) => parse_timezone(&s).unwrap_or_else(|e| {
                error!("🪛️ {e} Using UTC instead.");
                utc()
            }),
            Err(_) => {
                info!("🪛️ CANDB_TIMEZONE is not set. Stock will be checked against UTC.");
                utc()
            },
        };
        let audit_max_severity = env::var("CANDB_AUDIT_MAX_SEVERITY")
            .ok()
            .map(|s| parse_audit_severity(&s))
            .unwrap_or(DEFAULT_AUDIT_MAX_SEVERITY);
        let use_x_forwarded_for = env_flag("CANDB_USE_X_FORWARDED_FOR", false);
        let use_forwarded = env_flag("CANDB_USE_FORWARDED", false);
        Self { host, port, database_url, auth, timezone, audit_max_severity, use_x_forwarded_for, use_forwarded }
    }
}

/// Parses a fixed UTC offset such as `+10:00` or `-05:30`.
pub fn parse_timezone(s: &str) -> Result<FixedOffset, ServerError> {
    s.trim().parse::<FixedOffset>().map_err(|e| {
        ServerError::ConfigurationError(format!("'{s}' is not a valid UTC offset for CANDB_TIMEZONE. {e}"))
    })
}

fn parse_audit_severity(s: &str) -> u8 {
    match s.trim().parse::<u8>() {
        Ok(v) if v <= MAX_AUDIT_SEVERITY => v,
        Ok(v) => {
            warn!("🪛️ CANDB_AUDIT_MAX_SEVERITY ({v}) is above {MAX_AUDIT_SEVERITY}. Recording everything.");
            MAX_AUDIT_SEVERITY
        },
        Err(e) => {
            warn!("🪛️ Invalid value for CANDB_AUDIT_MAX_SEVERITY. {e}. Using {DEFAULT_AUDIT_MAX_SEVERITY}.");
            DEFAULT_AUDIT_MAX_SEVERITY
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an access token is valid for.
    pub token_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT operate \
             on production like this, since every token is invalidated when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), token_expiry_secs: DEFAULT_JWT_EXPIRY_SECS }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("CANDB_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [CANDB_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "CANDB_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        let token_expiry_secs = match env::var("CANDB_JWT_EXPIRY_SECS") {
            Ok(s) => s.parse::<i64>().ok().filter(|v| *v > 0).ok_or_else(|| {
                ServerError::ConfigurationError(format!("'{s}' is not a valid token lifetime [CANDB_JWT_EXPIRY_SECS]"))
            })?,
            Err(_) => {
                info!("🪛️ CANDB_JWT_EXPIRY_SECS is not set. Tokens will be valid for {DEFAULT_JWT_EXPIRY_SECS}s.");
                DEFAULT_JWT_EXPIRY_SECS
            },
        };
        Ok(Self { jwt_secret: Secret::new(secret), token_expiry_secs })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers can see. It excludes secrets to avoid passing sensitive
/// information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
