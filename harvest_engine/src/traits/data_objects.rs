use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use harvest_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{ConversionError, DropPoint, FarmerId, HaulerInfo, MatchStatus, TrackingStatus};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

//--------------------------------------      Pagination       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_LIMIT }
    }
}

impl Pagination {
    /// Pages are 1-based. A missing or zero page is the first page; the limit defaults to 20 and is capped at 100.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    pub fn has_more(&self, total: i64) -> bool {
        i64::from(self.page) * i64::from(self.limit) < total
    }
}

//--------------------------------------    OrderListFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderListFilter {
    /// Orders that have not yet been delivered.
    Active,
    /// Delivered and paid orders.
    Completed,
    #[default]
    All,
}

impl OrderListFilter {
    pub fn statuses(&self) -> Vec<TrackingStatus> {
        TrackingStatus::ALL
            .iter()
            .copied()
            .filter(|s| match self {
                OrderListFilter::Active => s.is_active(),
                OrderListFilter::Completed => !s.is_active(),
                OrderListFilter::All => true,
            })
            .collect()
    }
}

impl FromStr for OrderListFilter {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "all" => Ok(Self::All),
            _ => Err(ConversionError::new(s)),
        }
    }
}

//--------------------------------------     StatusUpdate      ---------------------------------------------------------
/// A single forward move of an order, together with any metadata that accompanies it.
///
/// Backends must only apply the update if the order is currently in `expected` and has not been deleted.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub expected: TrackingStatus,
    pub new_status: TrackingStatus,
    pub actor: String,
    pub note: Option<String>,
    pub hauler: Option<HaulerInfo>,
    pub drop_point: Option<DropPoint>,
    pub eta: Option<DateTime<Utc>>,
    pub delay_minutes: Option<i64>,
    pub delay_reason: Option<String>,
    pub upi_transaction_id: Option<String>,
    /// Set when the order enters `PAID`.
    pub paid_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DelayUpdate {
    pub delay_minutes: i64,
    pub reason: Option<String>,
    pub eta: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

//--------------------------------------   MatchStatusUpdate   ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct MatchStatusUpdate {
    pub new_status: MatchStatus,
    pub rejection_reason: Option<String>,
    pub at: DateTime<Utc>,
}

impl MatchStatusUpdate {
    pub fn expire(at: DateTime<Utc>) -> Self {
        Self { new_status: MatchStatus::Expired, rejection_reason: None, at }
    }

    pub fn reject(reason: Option<String>, at: DateTime<Utc>) -> Self {
        Self { new_status: MatchStatus::Rejected, rejection_reason: reason, at }
    }
}

//--------------------------------------  TransactionFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatusFilter {
    /// Paid orders.
    Completed,
    /// Delivered orders awaiting payment.
    Pending,
    #[default]
    All,
}

impl TransactionStatusFilter {
    pub fn statuses(&self) -> Vec<TrackingStatus> {
        match self {
            TransactionStatusFilter::Completed => vec![TrackingStatus::Paid],
            TransactionStatusFilter::Pending => vec![TrackingStatus::Delivered],
            TransactionStatusFilter::All => vec![TrackingStatus::Paid, TrackingStatus::Delivered],
        }
    }
}

impl FromStr for TransactionStatusFilter {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "all" => Ok(Self::All),
            _ => Err(ConversionError::new(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSortKey {
    #[default]
    Date,
    Amount,
    Crop,
}

impl FromStr for TransactionSortKey {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "crop" => Ok(Self::Crop),
            _ => Err(ConversionError::new(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ConversionError::new(s)),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// A fully resolved transaction query, as handed to the store. All defaults have already been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    pub farmer_id: FarmerId,
    pub status: TransactionStatusFilter,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub crop_type: Option<String>,
    pub sort_by: TransactionSortKey,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
}

//--------------------------------------       Earnings        ---------------------------------------------------------
/// A paid or delivered order, reduced to what the earnings summary needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarningsRow {
    pub tracking_status: TrackingStatus,
    pub total_amount: Money,
    /// Whether the order settled on or after the start of the current month.
    pub in_current_month: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsAggregate {
    pub total_earned: Money,
    pub this_month: Money,
    pub pending: Money,
    pub paid_count: i64,
    pub this_month_count: i64,
    pub pending_count: i64,
}

impl EarningsAggregate {
    pub fn from_rows(rows: &[EarningsRow]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, row| {
            match row.tracking_status {
                TrackingStatus::Paid => {
                    acc.total_earned += row.total_amount;
                    acc.paid_count += 1;
                    if row.in_current_month {
                        acc.this_month += row.total_amount;
                        acc.this_month_count += 1;
                    }
                },
                TrackingStatus::Delivered => {
                    acc.pending += row.total_amount;
                    acc.pending_count += 1;
                },
                _ => {},
            }
            acc
        })
    }
}
