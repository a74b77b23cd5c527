use thiserror::Error;

use crate::db_types::{NewUser, Permission, User};

/// User and permission persistence operations a backend must provide.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new user with no permissions. Fails with [`AuthApiError::EmailTaken`] if the
    /// email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    /// Fetches a user (including their permission set) by id.
    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, AuthApiError>;

    /// Fetches a user (including their permission set) by email.
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;

    /// Grants the given permissions to a user. Granting a permission the user already holds is
    /// a no-op.
    async fn grant_permissions(&self, user_id: i64, permissions: &[Permission]) -> Result<(), AuthApiError>;

    /// Revokes the given permissions from a user, returning the number of grants removed.
    async fn revoke_permissions(&self, user_id: i64, permissions: &[Permission]) -> Result<u64, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The email {0} is already registered")]
    EmailTaken(String),
    #[error("The requested user ({0}) does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
