use std::fmt::Debug;

use log::*;

use crate::{
    audit_objects::AuditQueryFilter,
    db_types::{AuditEntry, NewAuditEntry},
    traits::{AuditLog, AuditLogError},
};

/// Everything is recorded at this level.
pub const MAX_AUDIT_SEVERITY: u8 = 5;

/// `AuditApi` writes the audit trail. Entries whose severity is above the configured threshold are dropped.
pub struct AuditApi<B> {
    db: B,
    max_severity: u8,
}

impl<B: Debug> Debug for AuditApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuditApi ({:?}, max severity {})", self.db, self.max_severity)
    }
}

impl<B> AuditApi<B>
where B: AuditLog
{
    pub fn new(db: B, max_severity: u8) -> Self {
        Self { db, max_severity: max_severity.min(MAX_AUDIT_SEVERITY) }
    }

    pub fn max_severity(&self) -> u8 {
        self.max_severity
    }

    /// Stores the entry unless the severity filter drops it. Returns the new entry's id if it was stored.
    pub async fn record(&self, entry: NewAuditEntry) -> Result<Option<i64>, AuditLogError> {
        if !entry.passes(self.max_severity) {
            trace!("📜️ Audit entry '{}' dropped by the severity filter", entry.message);
            return Ok(None);
        }
        let id = self.db.insert_audit_entry(entry).await?;
        Ok(Some(id))
    }

    /// Like [`Self::record`], but failures are logged instead of returned.
    pub async fn record_quietly(&self, entry: NewAuditEntry) {
        if let Err(e) = self.record(entry).await {
            warn!("📜️ Could not write audit entry. {e}");
        }
    }

    pub async fn entries(&self, query: AuditQueryFilter) -> Result<Vec<AuditEntry>, AuditLogError> {
        self.db.fetch_audit_entries(query).await
    }
}
