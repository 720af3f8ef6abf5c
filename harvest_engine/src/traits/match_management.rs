use chrono::{DateTime, Utc};

use crate::{
    db_types::{FarmerId, Match, MatchId, MatchStatus, NewMatch, Order, OrderId},
    traits::{MatchStatusUpdate, StoreError},
};

/// Match offer lookup and mutation.
///
/// Every status change is a compare-and-set on the current status. This is the mechanism that guarantees that a
/// match leaves `PENDING_ACCEPTANCE` exactly once, no matter how many accepts, rejects and expiry sweeps race on it.
#[allow(async_fn_in_trait)]
pub trait MatchManagement {
    async fn fetch_match(&self, id: MatchId) -> Result<Option<Match>, StoreError>;

    /// Pending matches for the farmer that are still open at `now`, most urgent (earliest `expires_at`) first.
    async fn fetch_pending_matches_for_farmer(
        &self,
        farmer_id: FarmerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Match>, StoreError>;

    async fn insert_match(&self, new_match: NewMatch) -> Result<Match, StoreError>;

    /// Applies `update` only if the match is currently in one of `allowed_from`. Returns `None` otherwise.
    async fn update_match_status(
        &self,
        id: MatchId,
        allowed_from: &[MatchStatus],
        update: MatchStatusUpdate,
    ) -> Result<Option<Match>, StoreError>;

    /// Accepts the match and materialises its order under `order_id`, in a single atomic step.
    ///
    /// Acceptance only happens if the match is pending and `expires_at` is not before `now`. Otherwise nothing is
    /// written and `None` is returned.
    async fn accept_match(
        &self,
        id: MatchId,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<Option<(Match, Order)>, StoreError>;

    /// Up to `limit` pending matches whose deadline is at or before `now`, oldest deadline first.
    async fn fetch_expired_pending(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Match>, StoreError>;
}
