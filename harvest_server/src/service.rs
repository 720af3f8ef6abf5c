//! The farmer-facing service.
//!
//! `FarmerService` is the single entry point for callers. It validates farmer ids and status strings, delegates to
//! the lifecycle APIs and turns every failure into a [`ServiceError`].
use std::{fmt::Debug, str::FromStr};

use chrono::Duration;
use harvest_engine::{
    db_types::{FarmerId, Match, MatchId, OrderId, TrackingStatus},
    events::EventProducers,
    order_objects::{AcceptedMatch, MatchOffer, OrderPage, OrderView, TransitionRequest},
    traits::{OrderListFilter, Pagination, SortOrder, TransactionSortKey, TransactionStatusFilter},
    transaction_objects::{EarningsSummary, TransactionDetails, TransactionPage, TransactionQuery},
    MatchLifecycleApi,
    MatchManagement,
    OrderLifecycleApi,
    OrderManagement,
    TransactionApi,
    TransactionManagement,
};
use log::*;

use crate::{
    data_objects::{
        AcceptMatchRequest,
        ActiveOrderCount,
        DelayRequest,
        FarmerRequest,
        ListOrdersRequest,
        MatchRequest,
        OrderRequest,
        RejectMatchRequest,
        SweepResult,
        TransactionsRequest,
        TransitionOrderRequest,
    },
    errors::ServiceError,
};

pub struct FarmerService<B> {
    orders: OrderLifecycleApi<B>,
    matches: MatchLifecycleApi<B>,
    transactions: TransactionApi<B>,
}

impl<B> Debug for FarmerService<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FarmerService({:?}, {:?}, {:?})", self.orders, self.matches, self.transactions)
    }
}

impl<B: Clone> FarmerService<B> {
    pub fn new(db: B, producers: EventProducers, match_validity: Duration) -> Self {
        let orders = OrderLifecycleApi::new(db.clone(), producers);
        let matches = MatchLifecycleApi::new(db.clone()).with_validity(match_validity);
        let transactions = TransactionApi::new(db);
        Self { orders, matches, transactions }
    }
}

impl<B> FarmerService<B> {
    pub fn from_apis(
        orders: OrderLifecycleApi<B>,
        matches: MatchLifecycleApi<B>,
        transactions: TransactionApi<B>,
    ) -> Self {
        Self { orders, matches, transactions }
    }

    pub fn matches(&self) -> &MatchLifecycleApi<B> {
        &self.matches
    }
}

/// The one rule for caller-supplied farmer ids: present and strictly positive.
pub fn validate_farmer_id(farmer_id: Option<i64>) -> Result<FarmerId, ServiceError> {
    FarmerId::try_from(farmer_id).map_err(|e| {
        debug!("🔐️ Rejected farmer id {farmer_id:?}. {e}");
        ServiceError::from(e)
    })
}

/// Parses an optional enum-valued request field. Unknown values are an `INVALID_ARGUMENT`.
fn parse_optional<T: FromStr>(field: &str, value: Option<&str>) -> Result<Option<T>, ServiceError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(|_| {
            ServiceError::invalid_argument(format!("'{s}' is not a valid value for {field}")).with("field", field)
        }),
    }
}

fn order_id(raw: &str) -> Result<OrderId, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid_argument("An order id is required"));
    }
    Ok(OrderId::from(trimmed))
}

impl<B> FarmerService<B>
where B: OrderManagement + MatchManagement + TransactionManagement
{
    //----------------------------------------------   Orders    -------------------------------------------------------

    pub async fn list_orders(&self, req: ListOrdersRequest) -> Result<OrderPage, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        let filter = parse_optional::<OrderListFilter>("status", req.status.as_deref())?.unwrap_or_default();
        let page = self.orders.orders_for_farmer(farmer_id, filter, Pagination::new(req.page, req.limit)).await?;
        Ok(page)
    }

    pub async fn get_order(&self, req: OrderRequest) -> Result<OrderView, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        let order_id = order_id(&req.order_id)?;
        Ok(self.orders.order_for_farmer(&order_id, farmer_id).await?)
    }

    pub async fn count_active_orders(&self, req: FarmerRequest) -> Result<ActiveOrderCount, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        let count = self.orders.count_active(farmer_id).await?;
        Ok(ActiveOrderCount { count })
    }

    pub async fn transition_order(&self, req: TransitionOrderRequest) -> Result<OrderView, ServiceError> {
        let order_id = order_id(&req.order_id)?;
        let new_status = parse_optional::<TrackingStatus>("newStatus", Some(req.new_status.as_str()))?
            .ok_or_else(|| ServiceError::invalid_argument("A new status is required").with("orderId", &order_id))?;
        let request = TransitionRequest {
            new_status,
            actor: req.actor,
            note: req.note,
            hauler: req.hauler,
            drop_point: req.drop_point,
            eta: req.eta,
            delay_minutes: req.delay_minutes,
            delay_reason: req.delay_reason,
            upi_transaction_id: req.upi_transaction_id,
        };
        Ok(self.orders.transition(&order_id, request).await?)
    }

    pub async fn update_delay(&self, req: DelayRequest) -> Result<OrderView, ServiceError> {
        let order_id = order_id(&req.order_id)?;
        Ok(self.orders.update_delay(&order_id, req.delay_minutes, req.reason, req.eta).await?)
    }

    pub async fn delete_order(&self, req: OrderRequest) -> Result<(), ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        let order_id = order_id(&req.order_id)?;
        Ok(self.orders.soft_delete(&order_id, farmer_id).await?)
    }

    //----------------------------------------------   Matches   -------------------------------------------------------

    pub async fn create_match(&self, offer: MatchOffer) -> Result<Match, ServiceError> {
        Ok(self.matches.create_match(offer).await?)
    }

    pub async fn pending_matches(&self, req: FarmerRequest) -> Result<Vec<Match>, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        Ok(self.matches.pending_matches(farmer_id).await?)
    }

    pub async fn get_match(&self, req: MatchRequest) -> Result<Match, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        Ok(self.matches.get_match(MatchId(req.match_id), farmer_id).await?)
    }

    pub async fn accept_match(&self, req: AcceptMatchRequest) -> Result<AcceptedMatch, ServiceError> {
        if let Some(q) = req.accepted_quantity.filter(|q| !q.is_positive()) {
            return Err(ServiceError::invalid_argument(format!("Accepted quantity must be positive. Got {q}"))
                .with("matchId", req.match_id));
        }
        Ok(self.matches.accept(MatchId(req.match_id), req.is_partial, req.accepted_quantity).await?)
    }

    pub async fn reject_match(&self, req: RejectMatchRequest) -> Result<Match, ServiceError> {
        Ok(self.matches.reject(MatchId(req.match_id), req.reason).await?)
    }

    pub async fn expire_matches(&self) -> Result<SweepResult, ServiceError> {
        let expired = self.matches.expire_sweep().await?;
        Ok(SweepResult { expired })
    }

    //---------------------------------------------- Transactions -------------------------------------------------------

    pub async fn earnings_summary(&self, req: FarmerRequest) -> Result<EarningsSummary, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        Ok(self.transactions.earnings_summary(farmer_id).await?)
    }

    pub async fn transactions(&self, req: TransactionsRequest) -> Result<TransactionPage, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        let mut query = TransactionQuery::new(farmer_id);
        query.status = parse_optional::<TransactionStatusFilter>("status", req.status.as_deref())?;
        query.sort_by = parse_optional::<TransactionSortKey>("sortBy", req.sort_by.as_deref())?;
        query.sort_order = parse_optional::<SortOrder>("sortOrder", req.sort_order.as_deref())?;
        query.from_date = req.from_date;
        query.to_date = req.to_date;
        query.crop_type = req.crop_type;
        query.page = req.page;
        query.limit = req.limit;
        Ok(self.transactions.transactions(query).await?)
    }

    pub async fn transaction_details(&self, req: OrderRequest) -> Result<TransactionDetails, ServiceError> {
        let farmer_id = validate_farmer_id(req.farmer_id)?;
        let order_id = order_id(&req.order_id)?;
        Ok(self.transactions.transaction_details(&order_id, farmer_id).await?)
    }
}
