use std::collections::HashMap;

use log::{debug, trace};
use sqlx::{Row, SqliteConnection};

use crate::{db::sqlite::SqliteDatabaseError, db_types::Role};

/// The profile id and password hash for `username`.
pub async fn fetch_credentials(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<(i64, String)>, SqliteDatabaseError> {
    let row = sqlx::query("SELECT id, password_hash FROM profiles WHERE username = $1")
        .bind(username)
        .fetch_optional(conn)
        .await?;
    row.map(|r| -> Result<(i64, String), SqliteDatabaseError> {
        Ok((r.try_get::<i64, _>("id")?, r.try_get::<String, _>("password_hash")?))
    })
    .transpose()
}

pub async fn roles_for_profile(profile_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Role>, SqliteDatabaseError> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM role_assignments LEFT JOIN roles ON role_assignments.role_id = roles.id WHERE profile_id = $1",
    )
    .bind(profile_id)
    .fetch_all(conn)
    .await?;
    names
        .iter()
        .map(|r| r.parse::<Role>())
        .collect::<Result<Vec<Role>, _>>()
        .map_err(|e| SqliteDatabaseError::QueryError(e.to_string()))
}

/// Returns the number of `roles` the profile does not hold.
pub async fn count_missing_roles(
    profile_id: i64,
    roles: &[Role],
    conn: &mut SqliteConnection,
) -> Result<usize, SqliteDatabaseError> {
    let held = roles_for_profile(profile_id, conn).await?;
    let missing = roles.iter().filter(|r| !held.contains(r)).count();
    trace!("🗃️ Profile #{profile_id} lacks {missing} of {} roles", roles.len());
    Ok(missing)
}

async fn fetch_role_ids(conn: &mut SqliteConnection) -> Result<HashMap<Role, i64>, SqliteDatabaseError> {
    let rows = sqlx::query("SELECT id, name FROM roles").fetch_all(conn).await?;
    rows.iter()
        .map(|r| -> Result<(Role, i64), SqliteDatabaseError> {
            let id = r.try_get::<i64, _>("id")?;
            let name = r.try_get::<String, _>("name")?;
            let role = name.parse::<Role>().map_err(|e| SqliteDatabaseError::QueryError(e.to_string()))?;
            Ok((role, id))
        })
        .collect()
}

fn role_id(ids: &HashMap<Role, i64>, role: &Role) -> Result<i64, SqliteDatabaseError> {
    ids.get(role).copied().ok_or_else(|| SqliteDatabaseError::NotFound(format!("Role {role}")))
}

pub async fn assign_roles(profile_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let ids = fetch_role_ids(&mut *conn).await?;
    for role in roles {
        let role_id = role_id(&ids, role)?;
        sqlx::query("INSERT OR IGNORE INTO role_assignments (profile_id, role_id) VALUES ($1, $2)")
            .bind(profile_id)
            .bind(role_id)
            .execute(&mut *conn)
            .await?;
    }
    debug!("🗃️ Roles {roles:?} assigned to profile #{profile_id}");
    Ok(())
}

pub async fn remove_roles(
    profile_id: i64,
    roles: &[Role],
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let ids = fetch_role_ids(&mut *conn).await?;
    let mut removed = 0;
    for role in roles {
        let role_id = role_id(&ids, role)?;
        let result = sqlx::query("DELETE FROM role_assignments WHERE profile_id = $1 AND role_id = $2")
            .bind(profile_id)
            .bind(role_id)
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    debug!("🗃️ {removed} role assignments removed from profile #{profile_id}");
    Ok(removed)
}
