use chrono::Duration;
use cucumber::{given, then, when};
use harvest_common::{Kilograms, Money};
use harvest_engine::{
    db_types::{BuyerSummary, FarmerId, ListingSummary, MatchStatus, NewOrder, OrderId, TrackingStatus},
    order_objects::{MatchOffer, TransitionRequest},
    MatchLifecycleApi,
    MatchManagement,
    OrderManagement,
};

use crate::cucumber::HarvestWorld;

fn farmer(id: i64) -> FarmerId {
    FarmerId::try_from(id).expect("Not a valid farmer id")
}

fn status(s: &str) -> TrackingStatus {
    s.parse().expect("Not a valid tracking status")
}

fn offer(farmer_id: i64, kg: i64, price: i64) -> MatchOffer {
    MatchOffer {
        listing_id: 1,
        farmer_id: farmer(farmer_id),
        buyer_id: 7,
        listing: ListingSummary { crop_type: "Tomato".into(), quantity: Kilograms::from(kg), photo_url: None },
        buyer: BuyerSummary { business_type: "Restaurant".into(), city: "Pune".into() },
        quantity_matched: Kilograms::from(kg),
        price_per_kg: Money::from(price),
    }
}

//------------------------------------------      Orders      --------------------------------------------------------

#[given(expr = "farmer {int} has an order {word} in status {word} for {int} INR")]
async fn seed_order(world: &mut HarvestWorld, farmer_id: i64, order_id: String, s: String, amount: i64) {
    let listing = ListingSummary { crop_type: "Onion".into(), quantity: Kilograms::from(40), photo_url: None };
    let buyer = BuyerSummary { business_type: "Wholesaler".into(), city: "Nashik".into() };
    let order = NewOrder::new(OrderId::from(order_id), farmer(farmer_id), listing, buyer, Money::from(amount))
        .with_status(status(&s));
    world.system().orders.create_order(order).await.expect("Error creating order");
}

#[when(expr = "{word} moves order {word} to {word}")]
async fn move_order(world: &mut HarvestWorld, actor: String, order_id: String, s: String) {
    let request = TransitionRequest::new(status(&s), actor);
    let result = world.system().orders.transition(&OrderId::from(order_id), request).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.record_order_error(e),
    }
}

#[when(expr = "order {word} is delayed by {int} minutes because {string}")]
async fn delay_order(world: &mut HarvestWorld, order_id: String, minutes: i64, reason: String) {
    let result = world.system().orders.update_delay(&OrderId::from(order_id), minutes, Some(reason), None).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.record_order_error(e),
    }
}

#[then(expr = "order {word} is in status {word}")]
async fn check_order_status(world: &mut HarvestWorld, order_id: String, s: String) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    let order = order.expect("Order does not exist");
    assert_eq!(order.tracking_status, status(&s));
}

#[then(expr = "order {word} has {int} timeline entries")]
async fn check_timeline(world: &mut HarvestWorld, order_id: String, count: usize) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    let order = order.expect("Order does not exist");
    assert_eq!(order.status_history.len(), count);
}

#[then(expr = "order {word} has a delay of {int} minutes")]
async fn check_delay(world: &mut HarvestWorld, order_id: String, minutes: i64) {
    let order = world.system().db.fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    assert_eq!(order.expect("Order does not exist").delay_minutes, minutes);
}

#[then(expr = "farmer {int} has {int} active orders")]
async fn check_active_orders(world: &mut HarvestWorld, farmer_id: i64, count: i64) {
    let active = world.system().orders.count_active(farmer(farmer_id)).await.expect("Error counting orders");
    assert_eq!(active, count);
}

//------------------------------------------      Matches     --------------------------------------------------------

#[given(expr = "a match offer of {int}kg at {int} INR per kg for farmer {int}")]
async fn create_match(world: &mut HarvestWorld, kg: i64, price: i64, farmer_id: i64) {
    let m = world.system().matches.create_match(offer(farmer_id, kg, price)).await.expect("Error creating match");
    world.last_match = Some(m.id);
}

#[given(expr = "an overdue match offer of {int}kg at {int} INR per kg for farmer {int}")]
async fn create_overdue_match(world: &mut HarvestWorld, kg: i64, price: i64, farmer_id: i64) {
    let api = MatchLifecycleApi::new(world.system().db.clone()).with_validity(Duration::minutes(-5));
    let m = api.create_match(offer(farmer_id, kg, price)).await.expect("Error creating match");
    world.last_match = Some(m.id);
}

#[when("the farmer accepts the match")]
async fn accept_match(world: &mut HarvestWorld) {
    let id = world.last_match();
    match world.system().matches.accept(id, false, None).await {
        Ok(_) => world.last_error = None,
        Err(e) => world.record_match_error(e),
    }
}

#[when(expr = "the farmer rejects the match because {string}")]
async fn reject_match(world: &mut HarvestWorld, reason: String) {
    let id = world.last_match();
    match world.system().matches.reject(id, Some(reason)).await {
        Ok(_) => world.last_error = None,
        Err(e) => world.record_match_error(e),
    }
}

#[when("the expiry sweep runs")]
async fn run_sweep(world: &mut HarvestWorld) {
    let expired = world.system().matches.expire_sweep().await.expect("Error running expiry sweep");
    world.last_sweep = Some(expired);
}

#[then(expr = "the match is {word}")]
async fn check_match_status(world: &mut HarvestWorld, s: String) {
    let expected: MatchStatus = s.parse().expect("Not a valid match status");
    let m = world.system().db.fetch_match(world.last_match()).await.expect("Error fetching match");
    assert_eq!(m.expect("Match does not exist").status, expected);
}

#[then(expr = "the match total is {int} INR")]
async fn check_match_total(world: &mut HarvestWorld, total: i64) {
    let m = world.system().db.fetch_match(world.last_match()).await.expect("Error fetching match");
    assert_eq!(m.expect("Match does not exist").total_amount, Money::from(total));
}

#[then(expr = "the match has an order in status {word} for {int} INR")]
async fn check_match_order(world: &mut HarvestWorld, s: String, amount: i64) {
    let m = world.system().db.fetch_match(world.last_match()).await.expect("Error fetching match");
    let order_id = m.expect("Match does not exist").order_id.expect("Match has no order");
    let order = world.system().db.fetch_order(&order_id).await.expect("Error fetching order");
    let order = order.expect("Order does not exist");
    assert_eq!(order.tracking_status, status(&s));
    assert_eq!(order.total_amount, Money::from(amount));
}

#[then(expr = "{int} matches were expired")]
async fn check_sweep(world: &mut HarvestWorld, count: usize) {
    assert_eq!(world.last_sweep, Some(count));
}

//------------------------------------------      Results     --------------------------------------------------------

#[then("the operation succeeds")]
async fn check_success(world: &mut HarvestWorld) {
    assert_eq!(world.last_error, None);
}

#[then(expr = "the operation fails with {string}")]
async fn check_failure(world: &mut HarvestWorld, kind: String) {
    assert_eq!(world.last_error.as_deref(), Some(kind.as_str()));
}

#[then(expr = "farmer {int} has earned {int} INR with {int} INR pending")]
async fn check_earnings(world: &mut HarvestWorld, farmer_id: i64, earned: i64, pending: i64) {
    let summary = world.system().transactions.earnings_summary(farmer(farmer_id)).await.expect("Error fetching earnings");
    assert_eq!(summary.total_earned, Money::from(earned));
    assert_eq!(summary.pending, Money::from(pending));
}
