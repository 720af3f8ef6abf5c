use chrono::{DateTime, Duration, Utc};
use harvest_common::{helpers::mask_tail, Kilograms, Money, RUPEE_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BuyerSummary, FarmerId, Order, OrderId, TimelineEvent, TrackingStatus},
    traits::{
        EarningsAggregate,
        Pagination,
        SortOrder,
        TransactionFilter,
        TransactionSortKey,
        TransactionStatusFilter,
    },
};

/// How far back the transaction list looks when the caller gives no date range at all.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;
/// Receipts can be downloaded for this many whole days after the order settled.
pub const RECEIPT_WINDOW_DAYS: i64 = 90;
/// Number of trailing characters of the UPI reference left visible.
pub const UPI_VISIBLE_CHARS: usize = 4;

//--------------------------------------   TransactionQuery    ---------------------------------------------------------
/// A caller's transaction list request. Missing fields take their defaults in [`TransactionQuery::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub farmer_id: FarmerId,
    #[serde(default)]
    pub status: Option<TransactionStatusFilter>,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub sort_by: Option<TransactionSortKey>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl TransactionQuery {
    pub fn new(farmer_id: FarmerId) -> Self {
        Self {
            farmer_id,
            status: None,
            from_date: None,
            to_date: None,
            crop_type: None,
            sort_by: None,
            sort_order: None,
            page: None,
            limit: None,
        }
    }

    /// Applies the defaults. When neither end of the date range is given, the list starts 90 days before `now`.
    /// A range with only one end is left open at the other.
    pub fn resolve(self, now: DateTime<Utc>) -> TransactionFilter {
        let from_date = match (self.from_date, self.to_date) {
            (None, None) => Some(now - Duration::days(DEFAULT_LOOKBACK_DAYS)),
            (from, _) => from,
        };
        TransactionFilter {
            farmer_id: self.farmer_id,
            status: self.status.unwrap_or_default(),
            from_date,
            to_date: self.to_date,
            crop_type: self.crop_type.filter(|c| !c.trim().is_empty()),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            pagination: Pagination::new(self.page, self.limit),
        }
    }
}

//--------------------------------------    EarningsSummary    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub farmer_id: FarmerId,
    pub total_earned: Money,
    pub this_month: Money,
    pub pending: Money,
    pub paid_count: i64,
    pub this_month_count: i64,
    pub pending_count: i64,
    pub month_start: DateTime<Utc>,
    pub currency: String,
}

impl EarningsSummary {
    pub fn new(farmer_id: FarmerId, aggregate: EarningsAggregate, month_start: DateTime<Utc>) -> Self {
        Self {
            farmer_id,
            total_earned: aggregate.total_earned,
            this_month: aggregate.this_month,
            pending: aggregate.pending,
            paid_count: aggregate.paid_count,
            this_month_count: aggregate.this_month_count,
            pending_count: aggregate.pending_count,
            month_start,
            currency: RUPEE_CURRENCY_CODE.to_string(),
        }
    }
}

//--------------------------------------   TransactionRecord   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub order_id: OrderId,
    pub crop_type: String,
    pub quantity: Kilograms,
    pub buyer: BuyerSummary,
    pub amount: Money,
    pub status: TrackingStatus,
    /// When the order settled: its payment time, or its last update if it has not been paid.
    pub date: DateTime<Utc>,
}

impl From<&Order> for TransactionRecord {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            crop_type: order.listing.crop_type.clone(),
            quantity: order.listing.quantity,
            buyer: order.buyer.clone(),
            amount: order.total_amount,
            status: order.tracking_status,
            date: order.settled_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<TransactionRecord>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl TransactionPage {
    pub fn new(orders: &[Order], total: i64, pagination: Pagination) -> Self {
        Self {
            transactions: orders.iter().map(TransactionRecord::from).collect(),
            total,
            page: pagination.page,
            limit: pagination.limit,
            has_more: pagination.has_more(total),
        }
    }
}

//--------------------------------------  TransactionDetails   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub base_amount: Money,
    pub quality_bonus: Money,
    pub platform_fee: Money,
    pub net_amount: Money,
    /// The UPI transaction reference with all but the last four characters masked.
    pub upi_reference: Option<String>,
}

impl From<&Order> for PaymentBreakdown {
    fn from(order: &Order) -> Self {
        Self {
            base_amount: order.base_amount,
            quality_bonus: order.quality_bonus,
            platform_fee: Money::ZERO,
            net_amount: order.net_amount(),
            upi_reference: order.upi_transaction_id.as_deref().map(|id| mask_tail(id, UPI_VISIBLE_CHARS)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub timeline: Vec<TimelineEvent>,
    pub payment: PaymentBreakdown,
    pub paid_at: Option<DateTime<Utc>>,
    pub can_download_receipt: bool,
}

impl TransactionDetails {
    pub fn from_order(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            record: TransactionRecord::from(order),
            timeline: order.full_timeline(),
            payment: PaymentBreakdown::from(order),
            paid_at: order.paid_at,
            can_download_receipt: can_download_receipt(order.settled_at(), now),
        }
    }
}

/// True if no more than 90 whole days have passed since `settled_at`. The boundary day is included.
pub fn can_download_receipt(settled_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now - settled_at).num_days() <= RECEIPT_WINDOW_DAYS
}
