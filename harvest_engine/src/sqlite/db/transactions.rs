use chrono::{DateTime, Utc};
use harvest_common::Money;
use log::trace;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use super::{escape_like, orders, orders::OrderRow, status_list};
use crate::{
    db_types::{FarmerId, Order, OrderId, TrackingStatus},
    traits::{EarningsRow, StoreError, TransactionFilter, TransactionSortKey, TransactionStatusFilter},
};

/// The moment an order counts as settled: when it was paid or, failing that, when it was last touched.
const SETTLED_AT: &str = "COALESCE(paid_at, updated_at)";

#[derive(Debug, Clone, FromRow)]
struct EarningsRecord {
    tracking_status: TrackingStatus,
    total_amount: Money,
    in_current_month: bool,
}

pub async fn fetch_earnings_rows(
    farmer_id: FarmerId,
    month_start: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<EarningsRow>, StoreError> {
    let statuses = status_list(&TransactionStatusFilter::All.statuses());
    let sql = format!(
        r#"
            SELECT tracking_status, total_amount, {SETTLED_AT} >= $2 AS in_current_month
            FROM orders
            WHERE farmer_id = $1 AND deleted_at IS NULL AND tracking_status IN ({statuses})
        "#
    );
    let rows: Vec<EarningsRecord> =
        sqlx::query_as(&sql).bind(farmer_id.value()).bind(month_start).fetch_all(conn).await?;
    trace!("📝️ {} earnings rows fetched for farmer {farmer_id}", rows.len());
    let rows = rows
        .into_iter()
        .map(|r| EarningsRow {
            tracking_status: r.tracking_status,
            total_amount: r.total_amount,
            in_current_month: r.in_current_month,
        })
        .collect();
    Ok(rows)
}

fn push_where_clause(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TransactionFilter) {
    let statuses = status_list(&filter.status.statuses());
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    where_clause.push("deleted_at IS NULL");
    where_clause.push("farmer_id = ");
    where_clause.push_bind_unseparated(filter.farmer_id.value());
    where_clause.push(format!("tracking_status IN ({statuses})"));
    if let Some(from) = filter.from_date {
        where_clause.push(format!("{SETTLED_AT} >= "));
        where_clause.push_bind_unseparated(from);
    }
    if let Some(to) = filter.to_date {
        where_clause.push(format!("{SETTLED_AT} <= "));
        where_clause.push_bind_unseparated(to);
    }
    if let Some(crop) = filter.crop_type.as_ref().filter(|c| !c.trim().is_empty()) {
        where_clause.push("crop_type LIKE ");
        where_clause.push_bind_unseparated(format!("%{}%", escape_like(crop.trim())));
        where_clause.push_unseparated(" ESCAPE '\\'");
    }
}

/// Fetches one page of paid and delivered orders matching `filter`, and the total number of matches.
pub async fn query_transactions(
    filter: TransactionFilter,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Order>, i64), StoreError> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_where_clause(&mut count_builder, &filter);
    let total: i64 = count_builder.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_where_clause(&mut builder, &filter);
    let sort_column = match filter.sort_by {
        TransactionSortKey::Date => SETTLED_AT,
        TransactionSortKey::Amount => "CAST(total_amount AS REAL)",
        TransactionSortKey::Crop => "crop_type",
    };
    let order = filter.sort_order;
    builder.push(format!(" ORDER BY {sort_column} {order}, id {order}"));
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(filter.pagination.limit));
    builder.push(" OFFSET ");
    builder.push_bind(filter.pagination.offset());
    trace!("📝️ Executing query: {}", builder.sql());
    let rows: Vec<OrderRow> = builder.build_query_as::<OrderRow>().fetch_all(&mut *conn).await?;
    let orders = orders::hydrate_all(rows, conn).await?;
    Ok((orders, total))
}

/// Returns the order only if it belongs to `farmer_id` and is paid or delivered.
pub async fn fetch_transaction_detail(
    order_id: &OrderId,
    farmer_id: FarmerId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    let statuses = status_list(&TransactionStatusFilter::All.statuses());
    let sql = format!(
        "SELECT * FROM orders WHERE order_id = $1 AND farmer_id = $2 AND deleted_at IS NULL AND tracking_status IN \
         ({statuses})"
    );
    let row: Option<OrderRow> =
        sqlx::query_as(&sql).bind(order_id.as_str()).bind(farmer_id.value()).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => Ok(Some(orders::hydrate(row, conn).await?)),
        None => Ok(None),
    }
}
