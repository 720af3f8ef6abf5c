#![allow(dead_code)]
use chrono::{DateTime, Utc};
use harvest_common::{Kilograms, Money};
use harvest_engine::{
    db_types::{BuyerSummary, FarmerId, ListingSummary, NewOrder, OrderId, TrackingStatus},
    order_objects::MatchOffer,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// A fresh, migrated database in the temp directory.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to drop database {url}: {e}");
    }
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("harvest_it_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub fn farmer(id: i64) -> FarmerId {
    FarmerId::try_from(id).unwrap()
}

pub fn listing(crop_type: &str, quantity_kg: i64) -> ListingSummary {
    ListingSummary { crop_type: crop_type.to_string(), quantity: Kilograms::from(quantity_kg), photo_url: None }
}

pub fn buyer() -> BuyerSummary {
    BuyerSummary { business_type: "Hotel".to_string(), city: "Nashik".to_string() }
}

pub fn offer(farmer_id: i64, quantity_kg: i64, price_per_kg: i64) -> MatchOffer {
    MatchOffer {
        listing_id: 11,
        farmer_id: farmer(farmer_id),
        buyer_id: 21,
        listing: listing("Tomato", quantity_kg),
        buyer: buyer(),
        quantity_matched: Kilograms::from(quantity_kg),
        price_per_kg: Money::from(price_per_kg),
    }
}

pub fn order(order_id: &str, farmer_id: i64, crop: &str, status: TrackingStatus, amount: i64) -> NewOrder {
    NewOrder::new(OrderId::from(order_id), farmer(farmer_id), listing(crop, 40), buyer(), Money::from(amount))
        .with_status(status)
}

pub fn order_at(
    order_id: &str,
    farmer_id: i64,
    crop: &str,
    status: TrackingStatus,
    amount: i64,
    at: DateTime<Utc>,
) -> NewOrder {
    order(order_id, farmer_id, crop, status, amount).with_created_at(at)
}
