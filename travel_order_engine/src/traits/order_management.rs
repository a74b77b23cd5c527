use thiserror::Error;

use crate::{
    api::order_objects::{OrderQueryFilter, Page, Pagination},
    db_types::{NewOrder, Order, OrderStatus, OrderValidationError},
};

/// Order persistence operations a backend must provide.
///
/// Implementations perform plain single-row reads and writes; all authorization and
/// notification logic lives above this trait in [`crate::OrderFlowApi`].
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Inserts a new order owned by `owner_id`. The stored order always starts as
    /// [`OrderStatus::Requested`].
    async fn insert_order(&self, owner_id: i64, order: NewOrder) -> Result<Order, OrderFlowError>;

    /// Fetches a single order by its id, or `None` if it does not exist.
    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Sets the status on a single order row and bumps `updated_at`. Returns the updated order.
    async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<Order, OrderFlowError>;

    /// Fetches one page of orders matching the filter. Results are ordered by id ascending so
    /// that pagination is stable.
    async fn search_orders(
        &self,
        query: OrderQueryFilter,
        pagination: &Pagination,
    ) -> Result<Page<Order>, OrderFlowError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested order ({0}) does not exist")]
    OrderNotFound(i64),
    #[error("Insufficient permissions. {0}")]
    Forbidden(String),
    #[error("This order cannot be canceled")]
    NotCancelable,
    #[error("{0}")]
    Validation(#[from] OrderValidationError),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
