//! Fixtures for tests that need plausible orders and matches without going through a store.
use chrono::{DateTime, Duration, Utc};
use harvest_common::{Kilograms, Money};

use crate::db_types::{
    BuyerSummary,
    FarmerId,
    ListingSummary,
    Match,
    MatchId,
    MatchStatus,
    NewOrder,
    Order,
    OrderId,
    TimelineEvent,
    TrackingStatus,
};

pub fn farmer(id: i64) -> FarmerId {
    FarmerId::try_from(id).expect("test farmer ids are positive")
}

pub fn listing(crop_type: &str, quantity_kg: i64) -> ListingSummary {
    ListingSummary { crop_type: crop_type.to_string(), quantity: Kilograms::from(quantity_kg), photo_url: None }
}

pub fn buyer() -> BuyerSummary {
    BuyerSummary { business_type: "Restaurant".to_string(), city: "Pune".to_string() }
}

/// An order for `farmer_id` seeded directly in `status`, with a single timeline entry at `created_at`.
pub fn new_order(order_id: &str, farmer_id: i64, status: TrackingStatus, amount: i64, at: DateTime<Utc>) -> NewOrder {
    NewOrder::new(OrderId::from(order_id), farmer(farmer_id), listing("Tomato", 50), buyer(), Money::from(amount))
        .with_status(status)
        .with_created_at(at)
}

/// The order the store would hand back straight after inserting the equivalent [`new_order`]. Paid orders are
/// stamped as paid at `at`.
pub fn order_fixture(order_id: &str, farmer_id: i64, status: TrackingStatus, amount: i64, at: DateTime<Utc>) -> Order {
    let o = new_order(order_id, farmer_id, status, amount, at);
    Order {
        id: 1,
        order_id: o.order_id,
        farmer_id: o.farmer_id,
        match_id: None,
        tracking_status: o.tracking_status,
        status_history: vec![TimelineEvent::recorded(o.tracking_status, at, None, None)],
        listing: o.listing,
        buyer: o.buyer,
        hauler: None,
        drop_point: None,
        eta: None,
        delay_minutes: 0,
        delay_reason: None,
        total_amount: o.total_amount,
        base_amount: o.base_amount,
        quality_bonus: o.quality_bonus,
        upi_transaction_id: None,
        paid_at: (status == TrackingStatus::Paid).then_some(at),
        created_at: at,
        updated_at: at,
    }
}

/// A 100 kg tomato match at 20 per kg whose offer window closed an hour before `at`.
pub fn overdue_match_fixture(id: i64, farmer_id: i64, at: DateTime<Utc>) -> Match {
    let created_at = at - Duration::hours(25);
    Match {
        id: MatchId::from(id),
        listing_id: id,
        farmer_id: farmer(farmer_id),
        buyer_id: 7,
        listing: listing("Tomato", 100),
        buyer: buyer(),
        quantity_matched: Kilograms::from(100),
        price_per_kg: Money::from(20),
        total_amount: Money::from(2000),
        status: MatchStatus::PendingAcceptance,
        expires_at: at - Duration::hours(1),
        accepted_at: None,
        rejected_at: None,
        rejection_reason: None,
        order_id: None,
        created_at,
        updated_at: created_at,
    }
}
