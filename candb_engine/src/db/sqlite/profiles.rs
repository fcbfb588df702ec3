use candb_common::Money;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::{auth, SqliteDatabaseError},
    db_types::{NewProfile, Profile, Role},
};

const PROFILE_COLUMNS: &str =
    "id, username, first_name, last_name, email, phone, balance, admin_notes, version, created_at, updated_at";

/// Inserts a profile and grants it the `User` role. Not atomic on its own; run it inside a transaction.
pub async fn insert_profile(profile: NewProfile, conn: &mut SqliteConnection) -> Result<Profile, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO profiles (username, password_hash, first_name, last_name, email, phone, admin_notes) VALUES ($1, \
         $2, $3, $4, $5, $6, $7) RETURNING {PROFILE_COLUMNS}"
    );
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(profile.username)
        .bind(profile.password_hash)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .bind(profile.email)
        .bind(profile.phone)
        .bind(profile.admin_notes)
        .fetch_one(&mut *conn)
        .await?;
    auth::assign_roles(profile.id, &[Role::User], conn).await?;
    debug!("🗃️ Profile #{} ({}) created", profile.id, profile.username);
    Ok(profile)
}

pub async fn username_exists(username: &str, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM profiles WHERE username = $1").bind(username).fetch_one(conn).await?;
    Ok(count > 0)
}

pub async fn fetch_profile(id: i64, conn: &mut SqliteConnection) -> Result<Option<Profile>, SqliteDatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
    let profile = sqlx::query_as::<_, Profile>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(profile)
}

pub async fn fetch_profile_by_username(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, SqliteDatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1");
    let profile = sqlx::query_as::<_, Profile>(&sql).bind(username).fetch_optional(conn).await?;
    Ok(profile)
}

pub async fn fetch_profiles(conn: &mut SqliteConnection) -> Result<Vec<Profile>, SqliteDatabaseError> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY username ASC");
    let profiles = sqlx::query_as::<_, Profile>(&sql).fetch_all(conn).await?;
    trace!("🗃️ {} profiles fetched", profiles.len());
    Ok(profiles)
}

/// Sets the balance of a profile, provided it is still at `version`. Returns `None` if the row has moved on.
pub async fn set_balance(
    profile: &Profile,
    balance: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, SqliteDatabaseError> {
    let sql = format!(
        "UPDATE profiles SET balance = $1, version = version + 1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND \
         version = $3 RETURNING {PROFILE_COLUMNS}"
    );
    let profile =
        sqlx::query_as::<_, Profile>(&sql).bind(balance).bind(profile.id).bind(profile.version).fetch_optional(conn).await?;
    Ok(profile)
}
