use thiserror::Error;

use crate::{
    audit_objects::AuditQueryFilter,
    db_types::{AuditEntry, NewAuditEntry},
};

#[derive(Debug, Clone, Error)]
pub enum AuditLogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AuditLogError {
    fn from(e: sqlx::Error) -> Self {
        AuditLogError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait AuditLog {
    /// Stores the entry and returns its id.
    async fn insert_audit_entry(&self, entry: NewAuditEntry) -> Result<i64, AuditLogError>;

    /// Entries matching the filter, newest first.
    async fn fetch_audit_entries(&self, query: AuditQueryFilter) -> Result<Vec<AuditEntry>, AuditLogError>;
}
