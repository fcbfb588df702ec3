use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{AuditEvent, AuditLogType};

pub const DEFAULT_AUDIT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditQueryFilter {
    pub profile_id: Option<i64>,
    pub event: Option<AuditEvent>,
    pub log_type: Option<AuditLogType>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl AuditQueryFilter {
    pub fn with_profile_id(mut self, profile_id: i64) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    pub fn with_event(mut self, event: AuditEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_log_type(mut self, log_type: AuditLogType) -> Self {
        self.log_type = Some(log_type);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.profile_id.is_none() && self.event.is_none() && self.log_type.is_none() && self.since.is_none()
    }

    pub fn limit(&self) -> i64 {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_AUDIT_PAGE_SIZE)
    }
}
