use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{FarmerId, Order, OrderId, TrackingStatus};

/// Raised after an order has moved to its next stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChangedEvent {
    pub order_id: OrderId,
    pub farmer_id: FarmerId,
    pub previous_status: TrackingStatus,
    pub new_status: TrackingStatus,
    pub actor: String,
    pub changed_at: DateTime<Utc>,
}

impl OrderStatusChangedEvent {
    pub fn new(order: &Order, previous_status: TrackingStatus, actor: &str) -> Self {
        Self {
            order_id: order.order_id.clone(),
            farmer_id: order.farmer_id,
            previous_status,
            new_status: order.tracking_status,
            actor: actor.to_string(),
            changed_at: order.updated_at,
        }
    }
}

/// Raised after delay information has been recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDelayedEvent {
    pub order_id: OrderId,
    pub farmer_id: FarmerId,
    pub status: TrackingStatus,
    pub delay_minutes: i64,
    pub reason: Option<String>,
    pub eta: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderDelayedEvent {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            farmer_id: order.farmer_id,
            status: order.tracking_status,
            delay_minutes: order.delay_minutes,
            reason: order.delay_reason.clone(),
            eta: order.eta,
        }
    }
}

