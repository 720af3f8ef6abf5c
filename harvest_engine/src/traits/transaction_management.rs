use chrono::{DateTime, Utc};

use crate::{
    db_types::{FarmerId, Order, OrderId},
    traits::{EarningsRow, StoreError, TransactionFilter},
};

/// Read-only aggregate queries over paid and delivered orders.
#[allow(async_fn_in_trait)]
pub trait TransactionManagement {
    /// All of the farmer's `PAID` and `DELIVERED` orders, flagged by whether they settled on or after `month_start`.
    async fn fetch_earnings_rows(
        &self,
        farmer_id: FarmerId,
        month_start: DateTime<Utc>,
    ) -> Result<Vec<EarningsRow>, StoreError>;

    /// One page of transactions matching `filter`, plus the total count across all pages.
    async fn query_transactions(&self, filter: TransactionFilter) -> Result<(Vec<Order>, i64), StoreError>;

    /// The order, if it belongs to `farmer_id` and is `PAID` or `DELIVERED`.
    async fn fetch_transaction_detail(
        &self,
        order_id: &OrderId,
        farmer_id: FarmerId,
    ) -> Result<Option<Order>, StoreError>;
}
