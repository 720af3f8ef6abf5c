use chrono::{DateTime, Utc};
use harvest_common::{Kilograms, Money};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{BuyerSummary, DropPoint, FarmerId, HaulerInfo, ListingSummary, Match, Order, TimelineEvent, TrackingStatus},
    traits::Pagination,
};

/// A request to move an order to its next stage, with any metadata that should be recorded along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub new_status: TrackingStatus,
    pub actor: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub hauler: Option<HaulerInfo>,
    #[serde(default)]
    pub drop_point: Option<DropPoint>,
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delay_minutes: Option<i64>,
    #[serde(default)]
    pub delay_reason: Option<String>,
    #[serde(default)]
    pub upi_transaction_id: Option<String>,
}

impl TransitionRequest {
    pub fn new<S: Into<String>>(new_status: TrackingStatus, actor: S) -> Self {
        Self {
            new_status,
            actor: actor.into(),
            note: None,
            hauler: None,
            drop_point: None,
            eta: None,
            delay_minutes: None,
            delay_reason: None,
            upi_transaction_id: None,
        }
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_hauler(mut self, hauler: HaulerInfo) -> Self {
        self.hauler = Some(hauler);
        self
    }

    pub fn with_drop_point(mut self, drop_point: DropPoint) -> Self {
        self.drop_point = Some(drop_point);
        self
    }

    pub fn with_eta(mut self, eta: DateTime<Utc>) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn with_upi_transaction_id<S: Into<String>>(mut self, txid: S) -> Self {
        self.upi_transaction_id = Some(txid.into());
        self
    }
}

/// An order as presented to the farmer: the order itself, its position in the lifecycle and all seven stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub current_step: u8,
    pub total_steps: u8,
    pub timeline: Vec<TimelineEvent>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let current_step = order.current_step();
        let timeline = order.full_timeline();
        Self { order, current_step, total_steps: TrackingStatus::TOTAL_STEPS, timeline }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderView>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl OrderPage {
    pub fn new(orders: Vec<Order>, total: i64, pagination: Pagination) -> Self {
        Self {
            orders: orders.into_iter().map(OrderView::from).collect(),
            total,
            page: pagination.page,
            limit: pagination.limit,
            has_more: pagination.has_more(total),
        }
    }
}

/// A buyer's offer for (part of) a listing, as produced by the matching process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOffer {
    pub listing_id: i64,
    pub farmer_id: FarmerId,
    pub buyer_id: i64,
    pub listing: ListingSummary,
    pub buyer: BuyerSummary,
    pub quantity_matched: Kilograms,
    pub price_per_kg: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedMatch {
    #[serde(rename = "match")]
    pub accepted: Match,
    pub order: OrderView,
}
