use serde::Serialize;
use tos_common::format_display_date;

use crate::db_types::{Order, OrderStatus, User};

/// Emitted after an order's status has been written and the new status is `approved` or
/// `canceled`. Carries the order's owner so subscribers can address the notification without
/// another database round trip.
#[derive(Debug, Clone)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub owner: User,
    pub old_status: OrderStatus,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, owner: User, old_status: OrderStatus) -> Self {
        Self { order, owner, old_status }
    }
}

/// The structured body of a status-change notification. Dates are calendar dates in
/// `dd/mm/yyyy` form, not timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub order_id: i64,
    pub status: OrderStatus,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
}

impl NotificationPayload {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            destination: order.destination.clone(),
            departure_date: format_display_date(order.departure_date),
            return_date: format_display_date(order.return_date),
        }
    }
}
