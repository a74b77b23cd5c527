use log::*;

use crate::{
    db_types::{NewUser, Permission, User},
    traits::{AuthApiError, UserManagement},
};

/// `AuthApi` provides user account management: registration, lookup, and administrative
/// permission grants.
///
/// Password hashing and token issuance live at the API boundary; this type only ever sees
/// hashed credentials.
#[derive(Debug, Clone)]
pub struct AuthApi<B> {
    db: B,
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Registers a new account. New users hold no permissions; grants are administrative.
    pub async fn register_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let user = self.db.create_user(user).await?;
        info!("🔑️ New user #{} registered ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn fetch_user(&self, id: i64) -> Result<Option<User>, AuthApiError> {
        self.db.fetch_user_by_id(id).await
    }

    pub async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        self.db.fetch_user_by_email(email).await
    }

    pub async fn grant_permissions(&self, user_id: i64, permissions: &[Permission]) -> Result<(), AuthApiError> {
        self.db.grant_permissions(user_id, permissions).await?;
        info!("🔑️ Granted {permissions:?} to user #{user_id}");
        Ok(())
    }

    pub async fn revoke_permissions(&self, user_id: i64, permissions: &[Permission]) -> Result<u64, AuthApiError> {
        let removed = self.db.revoke_permissions(user_id, permissions).await?;
        info!("🔑️ Revoked {removed} permission(s) from user #{user_id}");
        Ok(removed)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
