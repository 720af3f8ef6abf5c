use chrono::{Duration, Utc};
use harvest_common::Money;
use harvest_engine::{
    db_types::{OrderId, TrackingStatus},
    events::EventProducers,
    order_objects::TransitionRequest,
    traits::{SortOrder, TransactionSortKey, TransactionStatusFilter},
    transaction_objects::TransactionQuery,
    OrderLifecycleApi,
    OrderManagement,
    SqliteDatabase,
    TransactionApi,
    TransactionApiError,
};

mod support;

use support::{farmer, order, order_at, prepare_test_env, tear_down};

async fn setup() -> (OrderLifecycleApi<SqliteDatabase>, TransactionApi<SqliteDatabase>) {
    let db = prepare_test_env().await;
    (OrderLifecycleApi::new(db.clone(), EventProducers::default()), TransactionApi::new(db))
}

async fn pay(orders: &OrderLifecycleApi<SqliteDatabase>, id: &str) {
    let request = TransitionRequest::new(TrackingStatus::Paid, "admin").with_upi_transaction_id("UPI20240615998877");
    orders.transition(&OrderId::from(id), request).await.unwrap();
}

#[tokio::test]
async fn earnings_summary() {
    let (orders, api) = setup().await;
    let long_ago = Utc::now() - Duration::days(70);
    let db = orders.db();
    db.insert_order(order("ORD-1", 1, "Tomato", TrackingStatus::Delivered, 1750)).await.unwrap();
    db.insert_order(order("ORD-2", 1, "Tomato", TrackingStatus::Delivered, 50)).await.unwrap();
    pay(&orders, "ORD-1").await;
    pay(&orders, "ORD-2").await;
    db.insert_order(order_at("ORD-3", 1, "Onion", TrackingStatus::Paid, 500, long_ago)).await.unwrap();
    db.insert_order(order("ORD-4", 1, "Onion", TrackingStatus::Delivered, 700)).await.unwrap();
    db.insert_order(order("ORD-5", 1, "Onion", TrackingStatus::InTransit, 999)).await.unwrap();
    db.insert_order(order("ORD-6", 2, "Onion", TrackingStatus::Paid, 10_000)).await.unwrap();

    let summary = api.earnings_summary(farmer(1)).await.unwrap();
    assert_eq!(summary.total_earned, Money::from(2300));
    assert_eq!(summary.this_month, Money::from(1800));
    assert_eq!(summary.pending, Money::from(700));
    assert_eq!(summary.paid_count, 3);
    assert_eq!(summary.this_month_count, 2);
    assert_eq!(summary.pending_count, 1);
    assert_eq!(summary.currency, "INR");

    let empty = api.earnings_summary(farmer(3)).await.unwrap();
    assert_eq!(empty.total_earned, Money::ZERO);
    assert_eq!(empty.paid_count, 0);
    tear_down(db.clone()).await;
}

#[tokio::test]
async fn transaction_list_defaults_to_ninety_days() {
    let (orders, api) = setup().await;
    let now = Utc::now();
    let db = orders.db();
    db.insert_order(order_at("ORD-10", 1, "Tomato", TrackingStatus::Paid, 300, now - Duration::days(10))).await.unwrap();
    db.insert_order(order_at("ORD-11", 1, "Onion", TrackingStatus::Delivered, 200, now - Duration::days(20))).await.unwrap();
    db.insert_order(order_at("ORD-12", 1, "Tomato", TrackingStatus::Paid, 100, now - Duration::days(100))).await.unwrap();
    db.insert_order(order_at("ORD-13", 1, "Tomato", TrackingStatus::Matched, 900, now - Duration::days(1))).await.unwrap();

    let page = api.transactions_at(TransactionQuery::new(farmer(1)), now).await.unwrap();
    assert_eq!(page.total, 2);
    let ids = page.transactions.iter().map(|t| t.order_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["ORD-10", "ORD-11"]);
    assert!(!page.has_more);

    let mut query = TransactionQuery::new(farmer(1));
    query.from_date = Some(now - Duration::days(200));
    let page = api.transactions_at(query, now).await.unwrap();
    assert_eq!(page.total, 3);
    tear_down(db.clone()).await;
}

#[tokio::test]
async fn transaction_list_filters_and_sorts() {
    let (orders, api) = setup().await;
    let now = Utc::now();
    let db = orders.db();
    db.insert_order(order_at("ORD-20", 1, "Tomato", TrackingStatus::Paid, 300, now - Duration::days(3))).await.unwrap();
    db.insert_order(order_at("ORD-21", 1, "Onion", TrackingStatus::Delivered, 1200, now - Duration::days(2))).await.unwrap();
    db.insert_order(order_at("ORD-22", 1, "Cherry Tomato", TrackingStatus::Paid, 90, now - Duration::days(1))).await.unwrap();

    let mut query = TransactionQuery::new(farmer(1));
    query.status = Some(TransactionStatusFilter::Pending);
    let page = api.transactions_at(query, now).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.transactions[0].status, TrackingStatus::Delivered);

    let mut query = TransactionQuery::new(farmer(1));
    query.crop_type = Some("tomato".to_string());
    let page = api.transactions_at(query, now).await.unwrap();
    assert_eq!(page.total, 2);

    let mut query = TransactionQuery::new(farmer(1));
    query.sort_by = Some(TransactionSortKey::Amount);
    query.sort_order = Some(SortOrder::Asc);
    let page = api.transactions_at(query, now).await.unwrap();
    let amounts = page.transactions.iter().map(|t| t.amount).collect::<Vec<_>>();
    assert_eq!(amounts, vec![Money::from(90), Money::from(300), Money::from(1200)]);

    let mut query = TransactionQuery::new(farmer(1));
    query.page = Some(1);
    query.limit = Some(2);
    let page = api.transactions_at(query, now).await.unwrap();
    assert_eq!(page.transactions.len(), 2);
    assert!(page.has_more);
    assert_eq!(page.transactions[0].order_id.as_str(), "ORD-22");

    let mut query = TransactionQuery::new(farmer(1));
    query.from_date = Some(now);
    query.to_date = Some(now - Duration::days(1));
    let err = api.transactions_at(query, now).await.unwrap_err();
    assert!(matches!(err, TransactionApiError::InvalidArgument(_)));
    tear_down(db.clone()).await;
}

#[tokio::test]
async fn crop_filter_treats_wildcards_literally() {
    let (orders, api) = setup().await;
    let now = Utc::now();
    let db = orders.db();
    db.insert_order(order_at("ORD-40", 1, "Tomato Cherry", TrackingStatus::Paid, 300, now - Duration::days(2))).await.unwrap();
    db.insert_order(order_at("ORD-41", 1, "Tomato_Cherry", TrackingStatus::Paid, 400, now - Duration::days(1))).await.unwrap();

    let mut query = TransactionQuery::new(farmer(1));
    query.crop_type = Some("o_C".to_string());
    let page = api.transactions_at(query, now).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.transactions[0].order_id.as_str(), "ORD-41");

    let mut query = TransactionQuery::new(farmer(1));
    query.crop_type = Some("%".to_string());
    let page = api.transactions_at(query, now).await.unwrap();
    assert_eq!(page.total, 0);
    tear_down(db.clone()).await;
}

#[tokio::test]
async fn transaction_details() {
    let (orders, api) = setup().await;
    let now = Utc::now();
    let db = orders.db();
    let graded = order("ORD-30", 1, "Tomato", TrackingStatus::Delivered, 1750).with_quality_bonus(Money::from(250));
    db.insert_order(graded).await.unwrap();
    pay(&orders, "ORD-30").await;
    db.insert_order(order_at("ORD-31", 1, "Tomato", TrackingStatus::Paid, 400, now - Duration::days(120))).await.unwrap();
    db.insert_order(order("ORD-32", 1, "Tomato", TrackingStatus::InTransit, 400)).await.unwrap();

    let details = api.transaction_details(&OrderId::from("ORD-30"), farmer(1)).await.unwrap();
    assert!(details.can_download_receipt);
    assert!(details.paid_at.is_some());
    assert_eq!(details.payment.upi_reference, Some(format!("{}8877", "*".repeat(13))));
    assert_eq!(details.payment.base_amount, Money::from(1750));
    assert_eq!(details.payment.quality_bonus, Money::from(250));
    assert_eq!(details.payment.platform_fee, Money::ZERO);
    assert_eq!(details.payment.net_amount, Money::from(2000));
    assert_eq!(details.timeline.len(), 7);

    let old = api.transaction_details(&OrderId::from("ORD-31"), farmer(1)).await.unwrap();
    assert!(!old.can_download_receipt);

    for (id, farmer_id) in [("ORD-30", 2), ("ORD-32", 1), ("ORD-99", 1)] {
        let err = api.transaction_details(&OrderId::from(id), farmer(farmer_id)).await.unwrap_err();
        assert_eq!(err, TransactionApiError::NotFound(OrderId::from(id)));
    }
    tear_down(db.clone()).await;
}
