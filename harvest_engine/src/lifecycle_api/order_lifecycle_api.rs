use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{FarmerId, NewOrder, Order, OrderId, TrackingStatus},
    events::{EventProducers, OrderDelayedEvent, OrderStatusChangedEvent},
    helpers::{is_match_order_id, MATCH_ORDER_PREFIX},
    lifecycle_api::{
        errors::OrderLifecycleError,
        order_objects::{OrderPage, OrderView, TransitionRequest},
    },
    traits::{DelayUpdate, OrderListFilter, OrderManagement, Pagination, StatusUpdate},
};

/// `OrderLifecycleApi` enforces the seven-stage order state machine and maintains each order's timeline.
///
/// Orders only ever move one stage forward at a time. Every successful move appends exactly one timeline entry and
/// publishes an [`OrderStatusChangedEvent`].
pub struct OrderLifecycleApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderLifecycleApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLifecycleApi")
    }
}

impl<B> OrderLifecycleApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderLifecycleApi<B>
where B: OrderManagement
{
    /// Seeds a new order. The order's initial status is recorded as its first timeline entry.
    ///
    /// Ids starting with [`MATCH_ORDER_PREFIX`] belong to orders created by accepting a match and are refused.
    pub async fn create_order(&self, order: NewOrder) -> Result<OrderView, OrderLifecycleError> {
        if is_match_order_id(&order.order_id) {
            return Err(OrderLifecycleError::InvalidArgument(format!(
                "Order id {} is reserved for accepted matches. Ids may not start with {MATCH_ORDER_PREFIX}",
                order.order_id
            )));
        }
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order [{}] created for farmer {} at {}", order.order_id, order.farmer_id, order.tracking_status);
        Ok(OrderView::from(order))
    }

    /// Moves the order to `request.new_status`, which must be the immediate successor of its current status.
    ///
    /// The store only applies the move if the order is still in the status that was validated here. If another
    /// transition got there first, the order is re-read and the caller gets the error that applies to its new state.
    pub async fn transition(
        &self,
        order_id: &OrderId,
        request: TransitionRequest,
    ) -> Result<OrderView, OrderLifecycleError> {
        if request.actor.trim().is_empty() {
            return Err(OrderLifecycleError::InvalidArgument("An actor is required for a status change".into()));
        }
        if let Some(m) = request.delay_minutes.filter(|m| *m < 0) {
            return Err(OrderLifecycleError::InvalidArgument(format!("Delay cannot be negative. Got {m} minutes")));
        }
        let order = self.fetch_live_order(order_id).await?;
        let current = order.tracking_status;
        let new_status = request.new_status;
        current.check_transition(new_status).map_err(|e| OrderLifecycleError::from_transition(order_id, e))?;

        let now = Utc::now();
        let actor = request.actor.clone();
        let update = StatusUpdate {
            expected: current,
            new_status,
            actor: request.actor,
            note: request.note,
            hauler: request.hauler,
            drop_point: request.drop_point,
            eta: request.eta,
            delay_minutes: request.delay_minutes,
            delay_reason: request.delay_reason,
            upi_transaction_id: request.upi_transaction_id,
            paid_at: (new_status == TrackingStatus::Paid).then_some(now),
            at: now,
        };
        match self.db.transition_order_status(order_id, update).await? {
            Some(updated) => {
                debug!("🔄️📦️ Order [{order_id}] moved from {current} to {new_status} by {actor}");
                self.producers.publish_status_changed(OrderStatusChangedEvent::new(&updated, current, &actor));
                Ok(OrderView::from(updated))
            },
            None => Err(self.explain_lost_transition(order_id, new_status).await),
        }
    }

    async fn explain_lost_transition(&self, order_id: &OrderId, new_status: TrackingStatus) -> OrderLifecycleError {
        warn!("🔄️📦️ Order [{order_id}] changed while moving it to {new_status}. Re-reading it.");
        match self.db.fetch_order(order_id).await {
            Ok(Some(order)) => match order.tracking_status.check_transition(new_status) {
                Err(e) => OrderLifecycleError::from_transition(order_id, e),
                Ok(()) => OrderLifecycleError::InvalidTransition {
                    order_id: order_id.clone(),
                    from: order.tracking_status,
                    to: new_status,
                },
            },
            Ok(None) => OrderLifecycleError::NotFound(order_id.clone()),
            Err(e) => e.into(),
        }
    }

    /// Records a delay against the order without changing its status.
    pub async fn update_delay(
        &self,
        order_id: &OrderId,
        delay_minutes: i64,
        reason: Option<String>,
        eta: Option<DateTime<Utc>>,
    ) -> Result<OrderView, OrderLifecycleError> {
        if delay_minutes < 0 {
            return Err(OrderLifecycleError::InvalidArgument(format!(
                "Delay cannot be negative. Got {delay_minutes} minutes"
            )));
        }
        let update = DelayUpdate { delay_minutes, reason, eta, at: Utc::now() };
        let order = self
            .db
            .update_order_delay(order_id, update)
            .await?
            .ok_or_else(|| OrderLifecycleError::NotFound(order_id.clone()))?;
        debug!("🔄️⏱️ Order [{order_id}] delayed by {delay_minutes} minutes");
        self.producers.publish_order_delayed(OrderDelayedEvent::from(&order));
        Ok(OrderView::from(order))
    }

    pub async fn orders_for_farmer(
        &self,
        farmer_id: FarmerId,
        filter: OrderListFilter,
        pagination: Pagination,
    ) -> Result<OrderPage, OrderLifecycleError> {
        let (orders, total) = self.db.fetch_orders_for_farmer(farmer_id, filter, pagination).await?;
        trace!("🔄️📦️ {} of {total} {filter:?} orders fetched for farmer {farmer_id}", orders.len());
        Ok(OrderPage::new(orders, total, pagination))
    }

    /// Fetches an order on behalf of `farmer_id`. Orders owned by somebody else are reported as
    /// [`OrderLifecycleError::Unauthorized`] rather than hidden.
    pub async fn order_for_farmer(
        &self,
        order_id: &OrderId,
        farmer_id: FarmerId,
    ) -> Result<OrderView, OrderLifecycleError> {
        let order = self.fetch_live_order(order_id).await?;
        if order.farmer_id != farmer_id {
            warn!("🔄️📦️ Farmer {farmer_id} asked for order [{order_id}], which belongs to {}", order.farmer_id);
            return Err(OrderLifecycleError::Unauthorized { order_id: order_id.clone(), farmer_id });
        }
        Ok(OrderView::from(order))
    }

    pub async fn count_active(&self, farmer_id: FarmerId) -> Result<i64, OrderLifecycleError> {
        let count = self.db.count_active_orders(farmer_id).await?;
        Ok(count)
    }

    /// Tombstones the order. It disappears from every query but is never physically removed.
    pub async fn soft_delete(&self, order_id: &OrderId, farmer_id: FarmerId) -> Result<(), OrderLifecycleError> {
        let order = self.fetch_live_order(order_id).await?;
        if order.farmer_id != farmer_id {
            return Err(OrderLifecycleError::Unauthorized { order_id: order_id.clone(), farmer_id });
        }
        if !self.db.soft_delete_order(order_id, Utc::now()).await? {
            return Err(OrderLifecycleError::NotFound(order_id.clone()));
        }
        info!("🔄️📦️ Order [{order_id}] deleted by farmer {farmer_id}");
        Ok(())
    }

    async fn fetch_live_order(&self, order_id: &OrderId) -> Result<Order, OrderLifecycleError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| OrderLifecycleError::NotFound(order_id.clone()))
    }
}
