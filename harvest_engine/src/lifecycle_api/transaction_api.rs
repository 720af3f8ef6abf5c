use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{FarmerId, OrderId},
    helpers::start_of_month,
    lifecycle_api::{
        errors::TransactionApiError,
        transaction_objects::{EarningsSummary, TransactionDetails, TransactionPage, TransactionQuery},
    },
    traits::{EarningsAggregate, TransactionManagement},
};

/// `TransactionApi` provides the farmer's read-only financial views: the earnings summary, the transaction list and
/// the per-transaction receipt details.
///
/// Only `PAID` and `DELIVERED` orders are transactions. Everything earlier in the lifecycle is invisible here.
pub struct TransactionApi<B> {
    db: B,
}

impl<B> Debug for TransactionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TransactionApi")
    }
}

impl<B> TransactionApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> TransactionApi<B>
where B: TransactionManagement
{
    /// Total paid, paid this calendar month (UTC) and pending (delivered but unpaid) amounts for the farmer.
    pub async fn earnings_summary(&self, farmer_id: FarmerId) -> Result<EarningsSummary, TransactionApiError> {
        let month_start = start_of_month(Utc::now());
        let rows = self.db.fetch_earnings_rows(farmer_id, month_start).await?;
        let aggregate = EarningsAggregate::from_rows(&rows);
        debug!(
            "💰️ Farmer {farmer_id} has earned {} ({} this month). {} pending",
            aggregate.total_earned, aggregate.this_month, aggregate.pending
        );
        Ok(EarningsSummary::new(farmer_id, aggregate, month_start))
    }

    pub async fn transactions(&self, query: TransactionQuery) -> Result<TransactionPage, TransactionApiError> {
        self.transactions_at(query, Utc::now()).await
    }

    /// As [`Self::transactions`], with the default date window measured back from `now`.
    pub async fn transactions_at(
        &self,
        query: TransactionQuery,
        now: DateTime<Utc>,
    ) -> Result<TransactionPage, TransactionApiError> {
        let filter = query.resolve(now);
        if let (Some(from), Some(to)) = (filter.from_date, filter.to_date) {
            if from > to {
                return Err(TransactionApiError::InvalidArgument(format!(
                    "The start date {from} is after the end date {to}"
                )));
            }
        }
        let pagination = filter.pagination;
        let (orders, total) = self.db.query_transactions(filter).await?;
        trace!("💰️ {} of {total} transactions fetched", orders.len());
        Ok(TransactionPage::new(&orders, total, pagination))
    }

    /// The receipt view of a single transaction. Orders that belong to another farmer, or that are not yet
    /// transactions, are reported as not found.
    pub async fn transaction_details(
        &self,
        order_id: &OrderId,
        farmer_id: FarmerId,
    ) -> Result<TransactionDetails, TransactionApiError> {
        let order = self
            .db
            .fetch_transaction_detail(order_id, farmer_id)
            .await?
            .ok_or_else(|| TransactionApiError::NotFound(order_id.clone()))?;
        Ok(TransactionDetails::from_order(&order, Utc::now()))
    }
}
