use crate::traits::{OrderFlowError, OrderManagement, UserManagement};

/// The full set of behaviour a backend must implement to drive the order workflow.
///
/// [`crate::OrderFlowApi`] needs both order and user access: orders to mutate, and users to
/// resolve an order's owner when a status-change notification is emitted.
#[allow(async_fn_in_trait)]
pub trait WorkflowDatabase: Clone + OrderManagement + UserManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}
