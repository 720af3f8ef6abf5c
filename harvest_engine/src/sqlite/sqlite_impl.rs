//! `SqliteDatabase` is a concrete implementation of a Harvest engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{matches, new_pool, orders, transactions};
use crate::{
    db_types::{FarmerId, Match, MatchId, MatchStatus, NewMatch, NewOrder, Order, OrderId},
    traits::{
        DelayUpdate,
        EarningsRow,
        MatchManagement,
        MatchStatusUpdate,
        OrderListFilter,
        OrderManagement,
        Pagination,
        StatusUpdate,
        StoreError,
        TransactionFilter,
        TransactionManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_orders_for_farmer(
        &self,
        farmer_id: FarmerId,
        filter: OrderListFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_farmer(farmer_id, filter, pagination, &mut conn).await
    }

    async fn count_active_orders(&self, farmer_id: FarmerId) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::count_active_orders(farmer_id, &mut conn).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] has been saved in the DB with id {}", order.order_id, order.id);
        Ok(order)
    }

    /// The conditional status update runs first, so the transaction holds the write lock before anything is read.
    /// The timeline entry is appended in the same transaction, which keeps timeline order identical to the order in
    /// which transitions were serialised.
    async fn transition_order_status(
        &self,
        order_id: &OrderId,
        update: StatusUpdate,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = match orders::update_status_if(order_id, &update, &mut tx).await? {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                trace!("🗃️ Order [{order_id}] was not in {} any more. No update made.", update.expected);
                return Ok(None);
            },
        };
        let StatusUpdate { new_status, actor, note, at, .. } = update;
        orders::insert_timeline_entry(order_id, new_status, Some(actor), note, at, &mut tx).await?;
        let order = orders::hydrate(row, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{order_id}] moved to {new_status}");
        Ok(Some(order))
    }

    async fn update_order_delay(&self, order_id: &OrderId, update: DelayUpdate) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_delay(order_id, update, &mut conn).await
    }

    async fn soft_delete_order(&self, order_id: &OrderId, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = orders::soft_delete(order_id, at, &mut conn).await?;
        if deleted {
            debug!("🗃️ Order [{order_id}] has been tombstoned");
        }
        Ok(deleted)
    }
}

impl MatchManagement for SqliteDatabase {
    async fn fetch_match(&self, id: MatchId) -> Result<Option<Match>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_match(id, &mut conn).await
    }

    async fn fetch_pending_matches_for_farmer(
        &self,
        farmer_id: FarmerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Match>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_pending_for_farmer(farmer_id, now, &mut conn).await
    }

    async fn insert_match(&self, new_match: NewMatch) -> Result<Match, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::insert_match(new_match, &mut conn).await
    }

    async fn update_match_status(
        &self,
        id: MatchId,
        allowed_from: &[MatchStatus],
        update: MatchStatusUpdate,
    ) -> Result<Option<Match>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let new_status = update.new_status;
        let result = matches::update_status_if(id, allowed_from, update, &mut conn).await?;
        match &result {
            Some(_) => debug!("🗃️ Match {id} moved to {new_status}"),
            None => trace!("🗃️ Match {id} was not in any of {allowed_from:?}. No update made."),
        }
        Ok(result)
    }

    /// Accepts the match and creates its order atomically. The acceptance is the first statement of the
    /// transaction, so a concurrent reject or expiry either sees `ACCEPTED` or wins outright.
    async fn accept_match(
        &self,
        id: MatchId,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<Option<(Match, Order)>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let accepted = match matches::mark_accepted(id, &order_id, now, &mut tx).await? {
            Some(m) => m,
            None => {
                tx.rollback().await?;
                trace!("🗃️ Match {id} could not be accepted. It is either no longer pending or overdue.");
                return Ok(None);
            },
        };
        let new_order = NewOrder::from_match(&accepted, order_id, now);
        let order = match orders::insert_order(new_order, &mut tx).await {
            Ok(order) => order,
            Err(StoreError::OrderAlreadyExists(_)) => {
                tx.rollback().await?;
                return Err(StoreError::MatchAlreadyLinked(id));
            },
            Err(e) => return Err(e),
        };
        tx.commit().await?;
        info!("🗃️ Match {id} accepted. Order [{}] created", order.order_id);
        Ok(Some((accepted, order)))
    }

    async fn fetch_expired_pending(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Match>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_expired_pending(now, limit, &mut conn).await
    }
}

impl TransactionManagement for SqliteDatabase {
    async fn fetch_earnings_rows(
        &self,
        farmer_id: FarmerId,
        month_start: DateTime<Utc>,
    ) -> Result<Vec<EarningsRow>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_earnings_rows(farmer_id, month_start, &mut conn).await
    }

    async fn query_transactions(&self, filter: TransactionFilter) -> Result<(Vec<Order>, i64), StoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::query_transactions(filter, &mut conn).await
    }

    async fn fetch_transaction_detail(
        &self,
        order_id: &OrderId,
        farmer_id: FarmerId,
    ) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction_detail(order_id, farmer_id, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Applies the embedded schema migrations. Safe to call on an up-to-date database.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migrations failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
