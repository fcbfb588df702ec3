use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    audit_objects::AuditQueryFilter,
    db::sqlite::SqliteDatabaseError,
    db_types::{AuditEntry, NewAuditEntry},
};

pub async fn insert_entry(entry: NewAuditEntry, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let additional_data = entry.additional_data.map(|v| v.to_string());
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO audit_log (log_type, event, message, profile_id, origin, additional_data) VALUES ($1, $2, $3, \
         $4, $5, $6) RETURNING id",
    )
    .bind(entry.log_type)
    .bind(entry.event)
    .bind(entry.message)
    .bind(entry.profile_id)
    .bind(entry.origin)
    .bind(additional_data)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Audit entry #{id} written");
    Ok(id)
}

/// Newest entries first, capped at the filter's limit.
pub async fn fetch_entries(
    query: AuditQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<AuditEntry>, SqliteDatabaseError> {
    let limit = query.limit();
    let mut builder = QueryBuilder::new(
        "SELECT id, log_type, event, message, profile_id, origin, additional_data, time FROM audit_log ",
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(profile_id) = query.profile_id {
        where_clause.push("profile_id = ");
        where_clause.push_bind_unseparated(profile_id);
    }
    if let Some(event) = query.event {
        where_clause.push("event = ");
        where_clause.push_bind_unseparated(event);
    }
    if let Some(log_type) = query.log_type {
        where_clause.push("log_type = ");
        where_clause.push_bind_unseparated(log_type);
    }
    if let Some(since) = query.since {
        where_clause.push("time >= ");
        where_clause.push_bind_unseparated(since);
    }
    builder.push(" ORDER BY time DESC, id DESC LIMIT ");
    builder.push_bind(limit);
    trace!("🗃️ Executing query: {}", builder.sql());
    let entries = builder.build_query_as::<AuditEntry>().fetch_all(conn).await?;
    Ok(entries)
}
