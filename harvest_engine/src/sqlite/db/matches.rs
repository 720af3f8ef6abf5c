use chrono::{DateTime, Utc};
use harvest_common::{Kilograms, Money};
use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use super::match_status_list;
use crate::{
    db_types::{BuyerSummary, FarmerId, ListingSummary, Match, MatchId, MatchStatus, NewMatch, OrderId},
    traits::{MatchStatusUpdate, StoreError},
};

#[derive(Debug, Clone, FromRow)]
struct MatchRow {
    id: i64,
    listing_id: i64,
    farmer_id: i64,
    buyer_id: i64,
    crop_type: String,
    quantity_kg: Kilograms,
    photo_url: Option<String>,
    buyer_business_type: String,
    buyer_city: String,
    quantity_matched: Kilograms,
    price_per_kg: Money,
    total_amount: Money,
    status: MatchStatus,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    order_id: Option<OrderId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MatchRow> for Match {
    type Error = StoreError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let farmer_id = FarmerId::try_from(row.farmer_id)
            .map_err(|e| StoreError::CorruptRecord(format!("Match #{}: {e}", row.id)))?;
        Ok(Match {
            id: MatchId::from(row.id),
            listing_id: row.listing_id,
            farmer_id,
            buyer_id: row.buyer_id,
            listing: ListingSummary { crop_type: row.crop_type, quantity: row.quantity_kg, photo_url: row.photo_url },
            buyer: BuyerSummary { business_type: row.buyer_business_type, city: row.buyer_city },
            quantity_matched: row.quantity_matched,
            price_per_kg: row.price_per_kg,
            total_amount: row.total_amount,
            status: row.status,
            expires_at: row.expires_at,
            accepted_at: row.accepted_at,
            rejected_at: row.rejected_at,
            rejection_reason: row.rejection_reason,
            order_id: row.order_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert_all(rows: Vec<MatchRow>) -> Result<Vec<Match>, StoreError> {
    rows.into_iter().map(Match::try_from).collect()
}

pub async fn fetch_match(id: MatchId, conn: &mut SqliteConnection) -> Result<Option<Match>, StoreError> {
    let row: Option<MatchRow> =
        sqlx::query_as("SELECT * FROM matches WHERE id = $1").bind(id.value()).fetch_optional(conn).await?;
    row.map(Match::try_from).transpose()
}

pub async fn fetch_pending_for_farmer(
    farmer_id: FarmerId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Match>, StoreError> {
    let rows: Vec<MatchRow> = sqlx::query_as(
        r#"
            SELECT * FROM matches
            WHERE farmer_id = $1 AND status = $2 AND expires_at > $3
            ORDER BY expires_at ASC, id ASC
        "#,
    )
    .bind(farmer_id.value())
    .bind(MatchStatus::PendingAcceptance)
    .bind(now)
    .fetch_all(conn)
    .await?;
    convert_all(rows)
}

pub async fn insert_match(new_match: NewMatch, conn: &mut SqliteConnection) -> Result<Match, StoreError> {
    let row: MatchRow = sqlx::query_as(
        r#"
            INSERT INTO matches (
                listing_id,
                farmer_id,
                buyer_id,
                crop_type,
                quantity_kg,
                photo_url,
                buyer_business_type,
                buyer_city,
                quantity_matched,
                price_per_kg,
                total_amount,
                status,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING *;
        "#,
    )
    .bind(new_match.listing_id)
    .bind(new_match.farmer_id.value())
    .bind(new_match.buyer_id)
    .bind(new_match.listing.crop_type)
    .bind(new_match.listing.quantity)
    .bind(new_match.listing.photo_url)
    .bind(new_match.buyer.business_type)
    .bind(new_match.buyer.city)
    .bind(new_match.quantity_matched)
    .bind(new_match.price_per_kg)
    .bind(new_match.total_amount)
    .bind(MatchStatus::PendingAcceptance)
    .bind(new_match.expires_at)
    .bind(new_match.created_at)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Match #{} inserted for farmer {}", row.id, row.farmer_id);
    Match::try_from(row)
}

/// Compare-and-set on the match status. Returns `None` if the match is not in one of `allowed_from`.
pub async fn update_status_if(
    id: MatchId,
    allowed_from: &[MatchStatus],
    update: MatchStatusUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, StoreError> {
    let allowed = match_status_list(allowed_from);
    let sql = format!(
        r#"
            UPDATE matches SET
                status = $1,
                updated_at = $2,
                rejected_at = CASE WHEN $1 = 'REJECTED' THEN $2 ELSE rejected_at END,
                rejection_reason = COALESCE($3, rejection_reason)
            WHERE id = $4 AND status IN ({allowed})
            RETURNING *;
        "#
    );
    trace!("📝️ Executing query: {sql}");
    let row: Option<MatchRow> = sqlx::query_as(&sql)
        .bind(update.new_status)
        .bind(update.at)
        .bind(update.rejection_reason)
        .bind(id.value())
        .fetch_optional(conn)
        .await?;
    row.map(Match::try_from).transpose()
}

/// Marks a pending, unexpired match as accepted. Returns `None` if the match is not pending or its deadline passed
/// before `now`. This must be the first statement of the enclosing transaction.
pub async fn mark_accepted(
    id: MatchId,
    order_id: &OrderId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, StoreError> {
    let row: Option<MatchRow> = sqlx::query_as(
        r#"
            UPDATE matches SET
                status = $1,
                accepted_at = $2,
                updated_at = $2,
                order_id = $3
            WHERE id = $4 AND status = $5 AND expires_at >= $2
            RETURNING *;
        "#,
    )
    .bind(MatchStatus::Accepted)
    .bind(now)
    .bind(order_id.as_str())
    .bind(id.value())
    .bind(MatchStatus::PendingAcceptance)
    .fetch_optional(conn)
    .await?;
    row.map(Match::try_from).transpose()
}

pub async fn fetch_expired_pending(
    now: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Match>, StoreError> {
    let rows: Vec<MatchRow> = sqlx::query_as(
        r#"
            SELECT * FROM matches
            WHERE status = $1 AND expires_at <= $2
            ORDER BY expires_at ASC, id ASC
            LIMIT $3
        "#,
    )
    .bind(MatchStatus::PendingAcceptance)
    .bind(now)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    convert_all(rows)
}
