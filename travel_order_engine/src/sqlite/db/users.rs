use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{error::ErrorKind, FromRow, SqliteConnection};

use crate::{
    db_types::{NewUser, Permission, User},
    traits::AuthApiError,
};

/// The raw `users` row. Permissions live in their own table and are attached by the fetch
/// helpers below.
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, permissions: Vec<Permission>) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let email = user.email.clone();
    let row: UserRow =
        sqlx::query_as("INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING *")
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .fetch_one(conn)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.kind() == ErrorKind::UniqueViolation => AuthApiError::EmailTaken(email),
                _ => AuthApiError::from(e),
            })?;
    debug!("🗃️ User [{}] inserted with id {}", row.email, row.id);
    Ok(row.into_user(Vec::new()))
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    attach_permissions(row, conn).await
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(&mut *conn).await?;
    attach_permissions(row, conn).await
}

async fn attach_permissions(
    row: Option<UserRow>,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, AuthApiError> {
    let Some(row) = row else {
        return Ok(None);
    };
    let permissions = permissions_for_user(row.id, conn).await?;
    Ok(Some(row.into_user(permissions)))
}

pub async fn permissions_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Permission>, AuthApiError> {
    let permissions: Vec<Permission> =
        sqlx::query_scalar("SELECT permission FROM user_permissions WHERE user_id = $1 ORDER BY permission")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(permissions)
}

pub async fn grant_permissions(
    user_id: i64,
    permissions: &[Permission],
    conn: &mut SqliteConnection,
) -> Result<(), AuthApiError> {
    for permission in permissions {
        sqlx::query("INSERT OR IGNORE INTO user_permissions (user_id, permission) VALUES ($1, $2)")
            .bind(user_id)
            .bind(permission)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn revoke_permissions(
    user_id: i64,
    permissions: &[Permission],
    conn: &mut SqliteConnection,
) -> Result<u64, AuthApiError> {
    let mut removed = 0;
    for permission in permissions {
        let result = sqlx::query("DELETE FROM user_permissions WHERE user_id = $1 AND permission = $2")
            .bind(user_id)
            .bind(permission)
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    Ok(removed)
}
