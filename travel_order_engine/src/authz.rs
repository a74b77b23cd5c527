//! Authorization policy for orders.
//!
//! Three stateless predicates, evaluated per `(acting user, order)` pair. They carry no hidden
//! state and hit no storage; the caller supplies a fully-loaded `User` (including permissions).

use crate::db_types::{Order, OrderStatus, Permission, User};

/// A user may view an order if they hold `view-orders` or own it.
pub fn can_view(user: &User, order: &Order) -> bool {
    user.has_permission(Permission::ViewOrders) || user.owns(order)
}

/// A user may change an order's status through the generic update path if they hold
/// `update-order` and do *not* own the order. Owners cannot self-approve.
pub fn can_update_status(user: &User, order: &Order) -> bool {
    user.has_permission(Permission::UpdateOrder) && !user.owns(order)
}

/// A user may cancel an order if they own it or hold `delete-order`, and the order is not
/// already canceled.
///
/// Note that [`crate::api::OrderFlowApi::cancel_order`] layers one further business rule on
/// top of this predicate: an *approved* order can only be canceled by a `delete-order` holder.
pub fn can_cancel(user: &User, order: &Order) -> bool {
    (user.owns(order) || user.has_permission(Permission::DeleteOrder)) && order.status != OrderStatus::Canceled
}
