use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use candb_engine::{
    availability::AvailabilityError,
    AccountApiError,
    AuditLogError,
    AuthApiError,
    OrderFlowError,
    ProductApiError,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The product cannot be supplied. {0}")]
    InsufficientStock(String),
    #[error("Product availability is misconfigured. {0}")]
    AvailabilityFault(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::TokenNotIssued(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AvailabilityFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("The access token is invalid. {0}")]
    InvalidToken(String),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Could not issue an access token. {0}")]
    TokenNotIssued(String),
}

impl From<AvailabilityError> for ServerError {
    fn from(e: AvailabilityError) -> Self {
        match e {
            AvailabilityError::InvalidQuantity(_) | AvailabilityError::Codec(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
            e => {
                error!("💻️ Availability configuration fault. An operator needs to fix this. {e}");
                Self::AvailabilityFault(e.to_string())
            },
        }
    }
}

impl From<ProductApiError> for ServerError {
    fn from(e: ProductApiError) -> Self {
        match e {
            ProductApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            ProductApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            ProductApiError::ProductInUse(_) | ProductApiError::StaleVersion(_) => Self::Conflict(e.to_string()),
            ProductApiError::ValidationError(_) => Self::InvalidRequestBody(e.to_string()),
            ProductApiError::AvailabilityError(e) => e.into(),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            OrderFlowError::OrderNotFound(_)
            | OrderFlowError::OrderLineNotFound(_)
            | OrderFlowError::ProductNotFound(_)
            | OrderFlowError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::StaleVersion(_) | OrderFlowError::InvalidStatusChange { .. } => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::InsufficientStock { .. } => Self::InsufficientStock(e.to_string()),
            OrderFlowError::ValidationError(_) => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::AvailabilityError(e) => e.into(),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            AccountApiError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            AccountApiError::StaleVersion(_) | AccountApiError::UsernameTaken(_) => Self::Conflict(e.to_string()),
            AccountApiError::InsufficientFunds { .. } => Self::Conflict(e.to_string()),
            AccountApiError::InvalidAmount(_) | AccountApiError::ValidationError(_) => {
                Self::InvalidRequestBody(e.to_string())
            },
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::ProfileNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::RoleNotAllowed(_) => {
                Self::AuthenticationError(AuthError::InsufficientPermissions(e.to_string()))
            },
            AuthApiError::WeakPassword(_) => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::PasswordHashError(_) => Self::BackendError(e.to_string()),
            AuthApiError::RoleNotFound => {
                Self::BackendError(format!("Role definitions in Database and Code have diverged. {e}"))
            },
        }
    }
}

impl From<AuditLogError> for ServerError {
    fn from(e: AuditLogError) -> Self {
        Self::BackendError(e.to_string())
    }
}
