use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use harvest_common::{Kilograms, Money};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------       FarmerId        ---------------------------------------------------------
/// The owner of orders and matches. Farmer ids are always strictly positive.
///
/// Every entry point that accepts a caller-supplied farmer id funnels it through [`FarmerId::try_from`], so that the
/// validation rule lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "i64", into = "i64")]
pub struct FarmerId(i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidFarmerId {
    #[error("A farmer id is required")]
    Missing,
    #[error("Farmer id must be a positive integer, got {0}")]
    NotPositive(i64),
}

impl TryFrom<i64> for FarmerId {
    type Error = InvalidFarmerId;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(InvalidFarmerId::NotPositive(value))
        }
    }
}

impl TryFrom<Option<i64>> for FarmerId {
    type Error = InvalidFarmerId;

    fn try_from(value: Option<i64>) -> Result<Self, Self::Error> {
        value.ok_or(InvalidFarmerId::Missing).and_then(FarmerId::try_from)
    }
}

impl From<FarmerId> for i64 {
    fn from(value: FarmerId) -> Self {
        value.0
    }
}

impl Display for FarmerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FarmerId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        MatchId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MatchId(pub i64);

impl From<i64> for MatchId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl MatchId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognised value: {0}")]
pub struct ConversionError(String);

impl ConversionError {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------    TrackingStatus     ---------------------------------------------------------
/// The seven stages of an order, in the only order they may be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingStatus {
    /// The produce has been listed and is waiting for a buyer.
    Listed,
    /// A buyer's offer has been accepted.
    Matched,
    /// A hauler has been assigned and a pickup time agreed.
    PickupScheduled,
    AtDropPoint,
    InTransit,
    Delivered,
    /// The farmer has been paid. Terminal.
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusTransitionError {
    #[error("Order is already in status {0}")]
    AlreadyInStatus(TrackingStatus),
    #[error("Cannot move an order from {from} to {to}")]
    InvalidTransition { from: TrackingStatus, to: TrackingStatus },
}

impl TrackingStatus {
    pub const ALL: [TrackingStatus; 7] = [
        TrackingStatus::Listed,
        TrackingStatus::Matched,
        TrackingStatus::PickupScheduled,
        TrackingStatus::AtDropPoint,
        TrackingStatus::InTransit,
        TrackingStatus::Delivered,
        TrackingStatus::Paid,
    ];
    pub const TOTAL_STEPS: u8 = 7;

    /// The 1-based position of this stage in the order lifecycle.
    pub fn step(&self) -> u8 {
        match self {
            TrackingStatus::Listed => 1,
            TrackingStatus::Matched => 2,
            TrackingStatus::PickupScheduled => 3,
            TrackingStatus::AtDropPoint => 4,
            TrackingStatus::InTransit => 5,
            TrackingStatus::Delivered => 6,
            TrackingStatus::Paid => 7,
        }
    }

    /// The only status an order in this status may move to. `Paid` has none.
    pub fn successor(&self) -> Option<TrackingStatus> {
        match self {
            TrackingStatus::Listed => Some(TrackingStatus::Matched),
            TrackingStatus::Matched => Some(TrackingStatus::PickupScheduled),
            TrackingStatus::PickupScheduled => Some(TrackingStatus::AtDropPoint),
            TrackingStatus::AtDropPoint => Some(TrackingStatus::InTransit),
            TrackingStatus::InTransit => Some(TrackingStatus::Delivered),
            TrackingStatus::Delivered => Some(TrackingStatus::Paid),
            TrackingStatus::Paid => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackingStatus::Listed => "Listed",
            TrackingStatus::Matched => "Buyer matched",
            TrackingStatus::PickupScheduled => "Pickup scheduled",
            TrackingStatus::AtDropPoint => "At drop point",
            TrackingStatus::InTransit => "In transit",
            TrackingStatus::Delivered => "Delivered",
            TrackingStatus::Paid => "Payment received",
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.successor().is_none()
    }

    /// Orders in these stages still need something to happen before the farmer is paid out.
    pub fn is_active(&self) -> bool {
        !matches!(self, TrackingStatus::Delivered | TrackingStatus::Paid)
    }

    pub fn from_step(step: u8) -> Option<TrackingStatus> {
        TrackingStatus::ALL.iter().copied().find(|s| s.step() == step)
    }

    /// Checks that moving from `self` to `next` is the single legal forward step.
    pub fn check_transition(&self, next: TrackingStatus) -> Result<(), StatusTransitionError> {
        if *self == next {
            return Err(StatusTransitionError::AlreadyInStatus(next));
        }
        match self.successor() {
            Some(s) if s == next => Ok(()),
            _ => Err(StatusTransitionError::InvalidTransition { from: *self, to: next }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Listed => "LISTED",
            TrackingStatus::Matched => "MATCHED",
            TrackingStatus::PickupScheduled => "PICKUP_SCHEDULED",
            TrackingStatus::AtDropPoint => "AT_DROP_POINT",
            TrackingStatus::InTransit => "IN_TRANSIT",
            TrackingStatus::Delivered => "DELIVERED",
            TrackingStatus::Paid => "PAID",
        }
    }
}

impl Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TrackingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackingStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConversionError::new(s))
    }
}

//--------------------------------------      MatchStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// The offer is waiting for the farmer to respond, and has not yet expired.
    PendingAcceptance,
    Accepted,
    Rejected,
    Expired,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MatchStatus::PendingAcceptance)
    }

    /// Expired matches may still be explicitly rejected so that the farmer can clear them from their inbox.
    pub fn is_rejectable(&self) -> bool {
        matches!(self, MatchStatus::PendingAcceptance | MatchStatus::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::PendingAcceptance => "PENDING_ACCEPTANCE",
            MatchStatus::Accepted => "ACCEPTED",
            MatchStatus::Rejected => "REJECTED",
            MatchStatus::Expired => "EXPIRED",
        }
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING_ACCEPTANCE" => Ok(Self::PendingAcceptance),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            "EXPIRED" => Ok(Self::Expired),
            _ => Err(ConversionError::new(s)),
        }
    }
}

//--------------------------------------     TimelineEvent     ---------------------------------------------------------
/// One visit of an order to a lifecycle stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub step: u8,
    pub status: TrackingStatus,
    pub label: String,
    pub completed: bool,
    pub active: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub actor: Option<String>,
    pub note: Option<String>,
}

impl TimelineEvent {
    /// A stage the order has reached, as recorded at transition time.
    pub fn recorded(
        status: TrackingStatus,
        timestamp: DateTime<Utc>,
        actor: Option<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            step: status.step(),
            status,
            label: status.label().to_string(),
            completed: true,
            active: true,
            timestamp: Some(timestamp),
            actor,
            note,
        }
    }

    /// A placeholder for a stage that has no recorded visit.
    pub fn placeholder(status: TrackingStatus, completed: bool) -> Self {
        Self {
            step: status.step(),
            status,
            label: status.label().to_string(),
            completed,
            active: false,
            timestamp: None,
            actor: None,
            note: None,
        }
    }
}

//--------------------------------------   Denormalized refs   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub crop_type: String,
    pub quantity: Kilograms,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerSummary {
    pub business_type: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HaulerInfo {
    pub name: String,
    pub phone: String,
    pub vehicle_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropPoint {
    pub name: String,
    pub address: String,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub farmer_id: FarmerId,
    pub match_id: Option<MatchId>,
    pub tracking_status: TrackingStatus,
    /// The recorded visits, oldest first. The last entry is the only active one.
    pub status_history: Vec<TimelineEvent>,
    pub listing: ListingSummary,
    pub buyer: BuyerSummary,
    pub hauler: Option<HaulerInfo>,
    pub drop_point: Option<DropPoint>,
    pub eta: Option<DateTime<Utc>>,
    pub delay_minutes: i64,
    pub delay_reason: Option<String>,
    pub total_amount: Money,
    pub base_amount: Money,
    pub quality_bonus: Money,
    pub upi_transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn current_step(&self) -> u8 {
        self.tracking_status.step()
    }

    /// All seven stages, with recorded visits where they exist.
    ///
    /// Stages before the current one that have no recorded visit (orders seeded part-way through the lifecycle) are
    /// shown as completed without a timestamp. Stages after the current one are neither completed nor active.
    pub fn full_timeline(&self) -> Vec<TimelineEvent> {
        let current = self.current_step();
        TrackingStatus::ALL
            .iter()
            .map(|status| {
                self.status_history
                    .iter()
                    .find(|ev| ev.status == *status)
                    .cloned()
                    .unwrap_or_else(|| TimelineEvent::placeholder(*status, status.step() < current))
            })
            .collect()
    }

    /// The amount the farmer actually receives. There is no platform fee.
    pub fn net_amount(&self) -> Money {
        self.base_amount + self.quality_bonus
    }

    /// The time from which the receipt window is measured.
    pub fn settled_at(&self) -> DateTime<Utc> {
        self.paid_at.unwrap_or(self.updated_at)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub farmer_id: FarmerId,
    pub match_id: Option<MatchId>,
    /// The stage the order starts in. Its single timeline entry is recorded at `created_at`.
    pub tracking_status: TrackingStatus,
    pub listing: ListingSummary,
    pub buyer: BuyerSummary,
    pub total_amount: Money,
    pub base_amount: Money,
    pub quality_bonus: Money,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        order_id: OrderId,
        farmer_id: FarmerId,
        listing: ListingSummary,
        buyer: BuyerSummary,
        total_amount: Money,
    ) -> Self {
        Self {
            order_id,
            farmer_id,
            match_id: None,
            tracking_status: TrackingStatus::Listed,
            listing,
            buyer,
            total_amount,
            base_amount: total_amount,
            quality_bonus: Money::ZERO,
            actor: None,
            created_at: Utc::now(),
        }
    }

    /// The order that materialises when `m` is accepted.
    pub fn from_match(m: &Match, order_id: OrderId, at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            farmer_id: m.farmer_id,
            match_id: Some(m.id),
            tracking_status: TrackingStatus::Matched,
            listing: m.listing.clone(),
            buyer: m.buyer.clone(),
            total_amount: m.total_amount,
            base_amount: m.total_amount,
            quality_bonus: Money::ZERO,
            actor: Some("farmer".to_string()),
            created_at: at,
        }
    }

    pub fn with_status(mut self, status: TrackingStatus) -> Self {
        self.tracking_status = status;
        self
    }

    pub fn with_quality_bonus(mut self, bonus: Money) -> Self {
        self.quality_bonus = bonus;
        self.total_amount = self.base_amount + bonus;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

//--------------------------------------         Match         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub listing_id: i64,
    pub farmer_id: FarmerId,
    pub buyer_id: i64,
    pub listing: ListingSummary,
    pub buyer: BuyerSummary,
    pub quantity_matched: Kilograms,
    pub price_per_kg: Money,
    pub total_amount: Money,
    pub status: MatchStatus,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// True once the deadline has passed. A match is still acceptable at exactly `expires_at`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

//--------------------------------------        NewMatch       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub listing_id: i64,
    pub farmer_id: FarmerId,
    pub buyer_id: i64,
    pub listing: ListingSummary,
    pub buyer: BuyerSummary,
    pub quantity_matched: Kilograms,
    pub price_per_kg: Money,
    pub total_amount: Money,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
