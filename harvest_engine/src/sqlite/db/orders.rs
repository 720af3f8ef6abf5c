use chrono::{DateTime, Utc};
use harvest_common::{Kilograms, Money};
use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use super::status_list;
use crate::{
    db_types::{
        BuyerSummary,
        DropPoint,
        FarmerId,
        HaulerInfo,
        ListingSummary,
        MatchId,
        NewOrder,
        Order,
        OrderId,
        TimelineEvent,
        TrackingStatus,
    },
    traits::{DelayUpdate, OrderListFilter, Pagination, StatusUpdate, StoreError},
};

/// The flat `orders` row. Use [`hydrate`] to turn it into an [`Order`] with its timeline.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct OrderRow {
    id: i64,
    order_id: OrderId,
    farmer_id: i64,
    match_id: Option<i64>,
    tracking_status: TrackingStatus,
    crop_type: String,
    quantity_kg: Kilograms,
    photo_url: Option<String>,
    buyer_business_type: String,
    buyer_city: String,
    hauler_name: Option<String>,
    hauler_phone: Option<String>,
    hauler_vehicle_number: Option<String>,
    drop_point_name: Option<String>,
    drop_point_address: Option<String>,
    eta: Option<DateTime<Utc>>,
    delay_minutes: i64,
    delay_reason: Option<String>,
    total_amount: Money,
    base_amount: Money,
    quality_bonus: Money,
    upi_transaction_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct TimelineRow {
    status: TrackingStatus,
    actor: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, timeline: Vec<TimelineRow>) -> Result<Order, StoreError> {
        let farmer_id = FarmerId::try_from(self.farmer_id)
            .map_err(|e| StoreError::CorruptRecord(format!("Order {}: {e}", self.order_id)))?;
        let hauler = match (self.hauler_name, self.hauler_phone) {
            (Some(name), Some(phone)) => Some(HaulerInfo { name, phone, vehicle_number: self.hauler_vehicle_number }),
            _ => None,
        };
        let drop_point = match (self.drop_point_name, self.drop_point_address) {
            (Some(name), Some(address)) => Some(DropPoint { name, address }),
            _ => None,
        };
        let last = timeline.len().saturating_sub(1);
        let status_history = timeline
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let mut ev = TimelineEvent::recorded(row.status, row.created_at, row.actor, row.note);
                ev.active = i == last;
                ev
            })
            .collect();
        Ok(Order {
            id: self.id,
            order_id: self.order_id,
            farmer_id,
            match_id: self.match_id.map(MatchId::from),
            tracking_status: self.tracking_status,
            status_history,
            listing: ListingSummary { crop_type: self.crop_type, quantity: self.quantity_kg, photo_url: self.photo_url },
            buyer: BuyerSummary { business_type: self.buyer_business_type, city: self.buyer_city },
            hauler,
            drop_point,
            eta: self.eta,
            delay_minutes: self.delay_minutes,
            delay_reason: self.delay_reason,
            total_amount: self.total_amount,
            base_amount: self.base_amount,
            quality_bonus: self.quality_bonus,
            upi_transaction_id: self.upi_transaction_id,
            paid_at: self.paid_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Loads the recorded timeline for the row and assembles the full [`Order`].
pub(crate) async fn hydrate(row: OrderRow, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let timeline = fetch_timeline(&row.order_id, conn).await?;
    row.into_order(timeline)
}

pub(crate) async fn hydrate_all(rows: Vec<OrderRow>, conn: &mut SqliteConnection) -> Result<Vec<Order>, StoreError> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        orders.push(hydrate(row, conn).await?);
    }
    Ok(orders)
}

async fn fetch_timeline(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<TimelineRow>, sqlx::Error> {
    sqlx::query_as("SELECT status, actor, note, created_at FROM order_timeline WHERE order_id = $1 ORDER BY step ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}

/// Returns the live (non-deleted) order with the given `order_id`.
pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1 AND deleted_at IS NULL")
        .bind(order_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(Some(hydrate(row, conn).await?)),
        None => Ok(None),
    }
}

/// Inserts a new order and the timeline entry for its initial status. This is not atomic on its own; embed the call
/// inside a transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let order_id = order.order_id.clone();
    let row: OrderRow = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                farmer_id,
                match_id,
                tracking_status,
                crop_type,
                quantity_kg,
                photo_url,
                buyer_business_type,
                buyer_city,
                total_amount,
                base_amount,
                quality_bonus,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.farmer_id.value())
    .bind(order.match_id.map(|m| m.value()))
    .bind(order.tracking_status)
    .bind(order.listing.crop_type)
    .bind(order.listing.quantity)
    .bind(order.listing.photo_url)
    .bind(order.buyer.business_type)
    .bind(order.buyer.city)
    .bind(order.total_amount)
    .bind(order.base_amount)
    .bind(order.quality_bonus)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::on_unique_violation(e, StoreError::OrderAlreadyExists(order_id.clone())))?;
    insert_timeline_entry(&order_id, order.tracking_status, order.actor, None, order.created_at, conn).await?;
    debug!("📝️ Order [{order_id}] inserted with id {}", row.id);
    hydrate(row, conn).await
}

pub async fn insert_timeline_entry(
    order_id: &OrderId,
    status: TrackingStatus,
    actor: Option<String>,
    note: Option<String>,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO order_timeline (order_id, step, status, actor, note, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(order_id.as_str())
    .bind(i64::from(status.step()))
    .bind(status)
    .bind(actor)
    .bind(note)
    .bind(at)
    .execute(conn)
    .await?;
    trace!("📝️ Timeline entry {status} recorded for order [{order_id}]");
    Ok(())
}

/// Moves the order to the new status, but only if it is currently in `update.expected`. This must be the first
/// statement of the enclosing transaction so that the write lock is held before anything is read.
///
/// Returns `None` if no live order in the expected status was found.
pub async fn update_status_if(
    order_id: &OrderId,
    update: &StatusUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, StoreError> {
    let hauler = update.hauler.as_ref();
    let drop_point = update.drop_point.as_ref();
    let row = sqlx::query_as(
        r#"
            UPDATE orders SET
                tracking_status = $1,
                updated_at = $2,
                hauler_name = COALESCE($3, hauler_name),
                hauler_phone = COALESCE($4, hauler_phone),
                hauler_vehicle_number = CASE WHEN $3 IS NULL THEN hauler_vehicle_number ELSE $5 END,
                drop_point_name = COALESCE($6, drop_point_name),
                drop_point_address = COALESCE($7, drop_point_address),
                eta = COALESCE($8, eta),
                delay_minutes = COALESCE($9, delay_minutes),
                delay_reason = COALESCE($10, delay_reason),
                upi_transaction_id = COALESCE($11, upi_transaction_id),
                paid_at = COALESCE($12, paid_at)
            WHERE order_id = $13 AND tracking_status = $14 AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(update.new_status)
    .bind(update.at)
    .bind(hauler.map(|h| h.name.clone()))
    .bind(hauler.map(|h| h.phone.clone()))
    .bind(hauler.and_then(|h| h.vehicle_number.clone()))
    .bind(drop_point.map(|d| d.name.clone()))
    .bind(drop_point.map(|d| d.address.clone()))
    .bind(update.eta)
    .bind(update.delay_minutes)
    .bind(update.delay_reason.clone())
    .bind(update.upi_transaction_id.clone())
    .bind(update.paid_at)
    .bind(order_id.as_str())
    .bind(update.expected)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn update_delay(
    order_id: &OrderId,
    update: DelayUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"
            UPDATE orders SET
                delay_minutes = $1,
                delay_reason = $2,
                eta = COALESCE($3, eta),
                updated_at = $4
            WHERE order_id = $5 AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(update.delay_minutes)
    .bind(update.reason)
    .bind(update.eta)
    .bind(update.at)
    .bind(order_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => Ok(Some(hydrate(row, conn).await?)),
        None => Ok(None),
    }
}

pub async fn soft_delete(order_id: &OrderId, at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result =
        sqlx::query("UPDATE orders SET deleted_at = $1, updated_at = $1 WHERE order_id = $2 AND deleted_at IS NULL")
            .bind(at)
            .bind(order_id.as_str())
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}

/// Fetches one page of the farmer's orders, most recently updated first, along with the total count.
pub async fn fetch_orders_for_farmer(
    farmer_id: FarmerId,
    filter: OrderListFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), StoreError> {
    let statuses = status_list(&filter.statuses());
    let where_clause = format!("farmer_id = $1 AND deleted_at IS NULL AND tracking_status IN ({statuses})");
    let count_sql = format!("SELECT COUNT(*) FROM orders WHERE {where_clause}");
    let total: i64 = sqlx::query_scalar(&count_sql).bind(farmer_id.value()).fetch_one(&mut *conn).await?;
    let page_sql =
        format!("SELECT * FROM orders WHERE {where_clause} ORDER BY updated_at DESC, id DESC LIMIT $2 OFFSET $3");
    trace!("📝️ Executing query: {page_sql}");
    let rows: Vec<OrderRow> = sqlx::query_as(&page_sql)
        .bind(farmer_id.value())
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&mut *conn)
        .await?;
    let orders = hydrate_all(rows, conn).await?;
    Ok((orders, total))
}

pub async fn count_active_orders(farmer_id: FarmerId, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let statuses = status_list(&OrderListFilter::Active.statuses());
    let sql = format!(
        "SELECT COUNT(*) FROM orders WHERE farmer_id = $1 AND deleted_at IS NULL AND tracking_status IN ({statuses})"
    );
    let count: i64 = sqlx::query_scalar(&sql).bind(farmer_id.value()).fetch_one(conn).await?;
    Ok(count)
}
