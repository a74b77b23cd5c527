use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    api::order_objects::{OrderQueryFilter, Page, Pagination},
    authz,
    db_types::{NewOrder, Order, OrderStatus, Permission, User},
    events::{EventProducers, OrderStatusChangedEvent},
    traits::{OrderFlowError, WorkflowDatabase},
};

/// `OrderFlowApi` is the primary API for creating travel orders and moving them through their
/// status lifecycle on behalf of an acting user.
///
/// Every operation takes the acting [`User`] explicitly; there is no ambient authentication
/// state. The authorization predicates themselves live in [`crate::authz`].
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: WorkflowDatabase
{
    /// Submit a new travel order on behalf of `owner`.
    ///
    /// The creation constraints (non-empty destination of at most 255 characters, departure not
    /// in the past, return on or after departure) are checked here and surface as
    /// [`OrderFlowError::Validation`]. The stored order always starts as `Requested`, so no
    /// notification fires.
    pub async fn place_order(&self, owner: &User, order: NewOrder) -> Result<Order, OrderFlowError> {
        let today = Utc::now().date_naive();
        order.validate(today)?;
        let order = self.db.insert_order(owner.id, order).await?;
        debug!("✈️📦️ Order #{} to {} placed by user #{}", order.id, order.destination, owner.id);
        Ok(order)
    }

    /// Fetch a single order. The acting user must own the order or hold `view-orders`.
    pub async fn fetch_order(&self, acting: &User, order_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !authz::can_view(acting, &order) {
            return Err(OrderFlowError::Forbidden("You may not view this order".to_string()));
        }
        Ok(order)
    }

    /// Changes the status of an order through the generic review path.
    ///
    /// The acting user must hold `update-order` and must not own the order (owners cannot
    /// self-approve). Beyond that there is no transition-graph restriction: any status can be
    /// set, including moving an approved order back to `requested`.
    ///
    /// | From \ To | requested | approved | canceled |
    /// |-----------|-----------|----------|----------|
    /// | requested | no-op     | notify   | notify   |
    /// | approved  | silent    | no-op    | notify   |
    /// | canceled  | silent    | notify   | no-op    |
    ///
    /// A no-op transition (old == new) is not an error; it simply writes nothing and notifies
    /// nobody. Transitions landing on `approved` or `canceled` notify the order owner exactly
    /// once; transitions landing on `requested` are silent. The status write always completes
    /// before the notification is enqueued.
    pub async fn update_status(
        &self,
        acting: &User,
        order_id: i64,
        new_status: OrderStatus,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !authz::can_update_status(acting, &order) {
            return Err(OrderFlowError::Forbidden(
                "Only a non-owner with the update-order permission may change an order's status".to_string(),
            ));
        }
        let old_status = order.status;
        if old_status == new_status {
            debug!("✈️🔄️ Order #{order_id} already has status {new_status}. Nothing to do");
            return Ok(order);
        }
        let updated = self.db.update_order_status(order_id, new_status).await?;
        info!("✈️🔄️ Order #{order_id} moved from {old_status} to {new_status} by user #{}", acting.id);
        if matches!(new_status, OrderStatus::Approved | OrderStatus::Canceled) {
            self.notify_owner(&updated, old_status).await;
        }
        Ok(updated)
    }

    /// Cancels an order. This is a distinct policy from the generic status update: the owner
    /// may cancel their own order, as may any holder of `delete-order`.
    ///
    /// Two business rules temper this:
    /// * An order that is already `canceled` cannot be canceled again. This is a handled
    ///   failure ([`OrderFlowError::NotCancelable`]), not an authorization error.
    /// * An `approved` order can only be canceled by a `delete-order` holder; the owner alone
    ///   cannot walk back an approval.
    pub async fn cancel_order(&self, acting: &User, order_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.status == OrderStatus::Canceled {
            debug!("✈️❌️ Order #{order_id} is already canceled. Rejecting cancel request");
            return Err(OrderFlowError::NotCancelable);
        }
        if !authz::can_cancel(acting, &order) {
            return Err(OrderFlowError::Forbidden(
                "Only the order's owner or a delete-order holder may cancel an order".to_string(),
            ));
        }
        if order.status == OrderStatus::Approved && !acting.has_permission(Permission::DeleteOrder) {
            debug!("✈️❌️ User #{} may not cancel approved order #{order_id}", acting.id);
            return Err(OrderFlowError::NotCancelable);
        }
        let old_status = order.status;
        let updated = self.db.update_order_status(order_id, OrderStatus::Canceled).await?;
        info!("✈️❌️ Order #{order_id} canceled by user #{}", acting.id);
        self.notify_owner(&updated, old_status).await;
        Ok(updated)
    }

    /// Fetches one page of orders visible to the acting user.
    ///
    /// Users without `view-orders` only ever see their own orders; the remaining filters
    /// combine with that restriction. Results are ordered by id ascending.
    pub async fn search_orders(
        &self,
        acting: &User,
        mut filter: OrderQueryFilter,
        pagination: &Pagination,
    ) -> Result<Page<Order>, OrderFlowError> {
        if !acting.has_permission(Permission::ViewOrders) {
            filter.user_id = Some(acting.id);
        }
        debug!("✈️🔎️ Order search by user #{}: [{filter}]", acting.id);
        self.db.search_orders(filter, pagination).await
    }

    /// Publish a status-change event to every subscribed hook. Dispatch is fire-and-forget:
    /// the status write has already committed, and a failure here must not surface to the
    /// caller.
    async fn notify_owner(&self, order: &Order, old_status: OrderStatus) {
        if self.producers.status_changed_producer.is_empty() {
            return;
        }
        let owner = match self.db.fetch_user_by_id(order.user_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                error!("✈️📬️ Order #{} has no owner (user #{}). Notification dropped", order.id, order.user_id);
                return;
            },
            Err(e) => {
                error!("✈️📬️ Could not load owner of order #{} for notification. {e}", order.id);
                return;
            },
        };
        for producer in &self.producers.status_changed_producer {
            debug!("✈️📬️ Notifying status-change hook subscribers for order #{}", order.id);
            let event = OrderStatusChangedEvent::new(order.clone(), owner.clone(), old_status);
            producer.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
