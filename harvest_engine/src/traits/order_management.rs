use chrono::{DateTime, Utc};

use crate::{
    db_types::{FarmerId, NewOrder, Order, OrderId},
    traits::{DelayUpdate, OrderListFilter, Pagination, StatusUpdate, StoreError},
};

/// Order lookup and mutation.
///
/// Deleted orders are invisible to every method in this trait: backends behave as if they do not exist.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given `order_id`, including its recorded timeline.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Fetches one page of the farmer's orders whose status is covered by `filter`, most recently updated first.
    /// The second value is the total number of matching orders across all pages.
    async fn fetch_orders_for_farmer(
        &self,
        farmer_id: FarmerId,
        filter: OrderListFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), StoreError>;

    /// The number of the farmer's orders that have not been delivered yet.
    async fn count_active_orders(&self, farmer_id: FarmerId) -> Result<i64, StoreError>;

    /// Stores a new order along with the timeline entry for its initial status.
    ///
    /// Fails with [`StoreError::OrderAlreadyExists`] if the order id is taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Moves the order to `update.new_status` and appends the matching timeline entry, in one atomic step.
    ///
    /// The update only happens if the order is still in `update.expected`. If it is not (or the order does not
    /// exist), nothing is written and `None` is returned, so that concurrent transitions on the same order are
    /// serialised by the store.
    async fn transition_order_status(
        &self,
        order_id: &OrderId,
        update: StatusUpdate,
    ) -> Result<Option<Order>, StoreError>;

    /// Records delay metadata. The tracking status is left untouched. Returns `None` if the order does not exist.
    async fn update_order_delay(&self, order_id: &OrderId, update: DelayUpdate) -> Result<Option<Order>, StoreError>;

    /// Tombstones the order. Returns `false` if there was no live order to delete.
    async fn soft_delete_order(&self, order_id: &OrderId, at: DateTime<Utc>) -> Result<bool, StoreError>;
}
