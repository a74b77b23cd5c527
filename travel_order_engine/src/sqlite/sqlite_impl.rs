//! `SqliteDatabase` is a concrete implementation of a travel order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, orders, users};
use crate::{
    api::order_objects::{OrderQueryFilter, Page, Pagination},
    db_types::{NewOrder, NewUser, Order, OrderStatus, Permission, User},
    traits::{AuthApiError, OrderFlowError, OrderManagement, UserManagement, WorkflowDatabase},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, OrderFlowError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, owner_id: i64, order: NewOrder) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(owner_id, order, &mut conn).await?;
        debug!("🗃️ Order #{} has been saved in the DB for user #{owner_id}", order.id);
        Ok(order)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(id, status, &mut conn).await?;
        trace!("🗃️ Order #{id} is now {status}");
        Ok(order)
    }

    async fn search_orders(
        &self,
        query: OrderQueryFilter,
        pagination: &Pagination,
    ) -> Result<Page<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let page = orders::search_orders(query, pagination, &mut conn).await?;
        Ok(page)
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(id, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_email(email, &mut conn).await
    }

    async fn grant_permissions(&self, user_id: i64, permissions: &[Permission]) -> Result<(), AuthApiError> {
        let mut tx = self.pool.begin().await?;
        users::grant_permissions(user_id, permissions, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn revoke_permissions(&self, user_id: i64, permissions: &[Permission]) -> Result<u64, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        let removed = users::revoke_permissions(user_id, permissions, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

impl WorkflowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}
