use crate::traits::{AccountManagement, AuditLog, AuthManagement, OrderManagement, ProductManagement};

/// Everything the CanDB server needs from a storage backend.
pub trait CanDbDatabase:
    Clone + ProductManagement + OrderManagement + AccountManagement + AuthManagement + AuditLog
{
    /// The URL of the database
    fn url(&self) -> &str;
}
