use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use harvest_common::Kilograms;
use log::*;

use crate::{
    db_types::{FarmerId, Match, MatchId, MatchStatus, NewMatch},
    helpers::order_id_for_match,
    lifecycle_api::{
        errors::MatchLifecycleError,
        order_objects::{AcceptedMatch, MatchOffer, OrderView},
    },
    traits::{MatchManagement, MatchStatusUpdate},
};

/// How long a farmer has to respond to a new match, in hours.
pub const DEFAULT_MATCH_VALIDITY_HOURS: i64 = 24;
/// The most matches a single expiry sweep will touch.
pub const EXPIRY_BATCH_SIZE: i64 = 100;

/// `MatchLifecycleApi` manages match offers from creation until they are accepted, rejected or expire.
///
/// A match leaves `PENDING_ACCEPTANCE` exactly once. Every exit is a conditional update in the store, so when an
/// accept, a reject and the expiry sweep race on the same match, one of them wins and the others see a match that is
/// no longer pending.
pub struct MatchLifecycleApi<B> {
    db: B,
    validity: Duration,
}

impl<B> Debug for MatchLifecycleApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchLifecycleApi (validity: {}h)", self.validity.num_hours())
    }
}

impl<B> MatchLifecycleApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, validity: Duration::hours(DEFAULT_MATCH_VALIDITY_HOURS) }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> MatchLifecycleApi<B>
where B: MatchManagement
{
    /// Records a new offer. The total is the exact product of quantity and price, and the offer is open for the
    /// configured validity window from now.
    pub async fn create_match(&self, offer: MatchOffer) -> Result<Match, MatchLifecycleError> {
        if !offer.quantity_matched.is_positive() {
            return Err(MatchLifecycleError::InvalidArgument(format!(
                "Matched quantity must be positive. Got {}",
                offer.quantity_matched
            )));
        }
        if !offer.price_per_kg.is_positive() {
            return Err(MatchLifecycleError::InvalidArgument(format!(
                "Price per kg must be positive. Got {}",
                offer.price_per_kg
            )));
        }
        let total_amount = offer.price_per_kg.checked_times(offer.quantity_matched).ok_or_else(|| {
            MatchLifecycleError::InvalidArgument(format!(
                "{} at {} per kg is too large to represent",
                offer.quantity_matched, offer.price_per_kg
            ))
        })?;
        let now = Utc::now();
        let new_match = NewMatch {
            listing_id: offer.listing_id,
            farmer_id: offer.farmer_id,
            buyer_id: offer.buyer_id,
            listing: offer.listing,
            buyer: offer.buyer,
            quantity_matched: offer.quantity_matched,
            price_per_kg: offer.price_per_kg,
            total_amount,
            expires_at: now + self.validity,
            created_at: now,
        };
        let m = self.db.insert_match(new_match).await?;
        info!("🔄️🤝️ Match {} created for farmer {}. Total {} expires at {}", m.id, m.farmer_id, m.total_amount, m.expires_at);
        Ok(m)
    }

    pub async fn get_match(&self, match_id: MatchId, farmer_id: FarmerId) -> Result<Match, MatchLifecycleError> {
        let m = self.fetch(match_id).await?;
        if m.farmer_id != farmer_id {
            return Err(MatchLifecycleError::Unauthorized { match_id, farmer_id });
        }
        Ok(m)
    }

    /// Accepts the match and creates its order.
    ///
    /// Overdue matches are handled in two explicit steps: the match is first moved to `EXPIRED` (if nobody else has
    /// moved it yet), and then the caller is told it has [`MatchLifecycleError::Expired`].
    ///
    /// Partial acceptance is accepted as a flag only. The full matched quantity is always accepted; splitting the
    /// match and relisting the remainder is not supported.
    pub async fn accept(
        &self,
        match_id: MatchId,
        is_partial: bool,
        accepted_quantity: Option<Kilograms>,
    ) -> Result<AcceptedMatch, MatchLifecycleError> {
        let m = self.fetch(match_id).await?;
        if m.status != MatchStatus::PendingAcceptance {
            return Err(MatchLifecycleError::NoLongerPending { match_id, status: m.status });
        }
        let now = Utc::now();
        if m.is_overdue(now) {
            return Err(self.expire_overdue(&m, now).await);
        }
        if is_partial {
            warn!(
                "🔄️🤝️ Partial acceptance of match {match_id} requested ({} of {}). The full quantity will be \
                 accepted.",
                accepted_quantity.map(|q| q.to_string()).unwrap_or_else(|| "unspecified".into()),
                m.quantity_matched
            );
        }
        let order_id = order_id_for_match(match_id);
        match self.db.accept_match(match_id, order_id, now).await? {
            Some((accepted, order)) => {
                info!("🔄️🤝️ Match {match_id} accepted. Order [{}] is now {}", order.order_id, order.tracking_status);
                Ok(AcceptedMatch { accepted, order: OrderView::from(order) })
            },
            None => Err(self.explain_lost_acceptance(match_id, now).await),
        }
    }

    /// First half of the lazy expiry protocol: move an overdue match to `EXPIRED`, then report it.
    async fn expire_overdue(&self, m: &Match, now: DateTime<Utc>) -> MatchLifecycleError {
        let expired = MatchStatusUpdate::expire(now);
        match self.db.update_match_status(m.id, &[MatchStatus::PendingAcceptance], expired).await {
            Ok(Some(_)) => {
                debug!("🔄️🤝️ Match {} was overdue and has been expired", m.id);
                MatchLifecycleError::Expired { match_id: m.id, expires_at: m.expires_at }
            },
            // Somebody else moved it first. Report whatever it is now.
            Ok(None) => match self.db.fetch_match(m.id).await {
                Ok(Some(current)) if current.status == MatchStatus::Expired => {
                    MatchLifecycleError::Expired { match_id: m.id, expires_at: m.expires_at }
                },
                Ok(Some(current)) => MatchLifecycleError::NoLongerPending { match_id: m.id, status: current.status },
                Ok(None) => MatchLifecycleError::NotFound(m.id),
                Err(e) => e.into(),
            },
            Err(e) => e.into(),
        }
    }

    async fn explain_lost_acceptance(&self, match_id: MatchId, now: DateTime<Utc>) -> MatchLifecycleError {
        match self.db.fetch_match(match_id).await {
            Ok(Some(m)) if m.status == MatchStatus::PendingAcceptance && m.is_overdue(now) => {
                self.expire_overdue(&m, now).await
            },
            Ok(Some(m)) => {
                debug!("🔄️🤝️ Match {match_id} was claimed by another operation. It is now {}", m.status);
                MatchLifecycleError::NoLongerPending { match_id, status: m.status }
            },
            Ok(None) => MatchLifecycleError::NotFound(match_id),
            Err(e) => e.into(),
        }
    }

    /// Rejects the match. Pending matches can be rejected, and so can expired ones so that the farmer can clear
    /// them. Accepted and already-rejected matches cannot.
    pub async fn reject(&self, match_id: MatchId, reason: Option<String>) -> Result<Match, MatchLifecycleError> {
        let m = self.fetch(match_id).await?;
        if !m.status.is_rejectable() {
            return Err(MatchLifecycleError::NotRejectable { match_id, status: m.status });
        }
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let update = MatchStatusUpdate::reject(reason, Utc::now());
        let allowed = [MatchStatus::PendingAcceptance, MatchStatus::Expired];
        match self.db.update_match_status(match_id, &allowed, update).await? {
            Some(rejected) => {
                info!("🔄️🤝️ Match {match_id} rejected");
                Ok(rejected)
            },
            None => {
                let status = self.fetch(match_id).await?.status;
                debug!("🔄️🤝️ Match {match_id} changed to {status} before it could be rejected");
                Err(MatchLifecycleError::NoLongerPending { match_id, status })
            },
        }
    }

    /// Expires up to [`EXPIRY_BATCH_SIZE`] overdue pending matches and returns how many were expired.
    ///
    /// Each match is expired with its own conditional update, so a match that is accepted or rejected mid-sweep is
    /// simply skipped. A match whose update fails is logged and left for the next sweep; the sweep only fails when
    /// nothing could be expired at all. Running the sweep again with nothing overdue writes nothing and returns zero.
    pub async fn expire_sweep(&self) -> Result<usize, MatchLifecycleError> {
        let now = Utc::now();
        let overdue = self.db.fetch_expired_pending(now, EXPIRY_BATCH_SIZE).await?;
        if overdue.is_empty() {
            trace!("🕰️ No overdue matches");
            return Ok(0);
        }
        let mut expired = 0;
        let mut first_error = None;
        for m in overdue {
            let update = MatchStatusUpdate::expire(now);
            match self.db.update_match_status(m.id, &[MatchStatus::PendingAcceptance], update).await {
                Ok(Some(_)) => expired += 1,
                Ok(None) => debug!("🕰️ Match {} left PENDING_ACCEPTANCE before the sweep reached it", m.id),
                Err(e) => {
                    error!("🕰️ Could not expire match {}. {e}", m.id);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                },
            }
        }
        match first_error {
            Some(e) if expired == 0 => Err(e.into()),
            Some(_) => {
                warn!("🕰️ {expired} overdue matches expired. The rest will be retried on the next sweep");
                Ok(expired)
            },
            None => {
                info!("🕰️ {expired} overdue matches expired");
                Ok(expired)
            },
        }
    }

    /// Open offers for the farmer, most urgent first.
    pub async fn pending_matches(&self, farmer_id: FarmerId) -> Result<Vec<Match>, MatchLifecycleError> {
        let matches = self.db.fetch_pending_matches_for_farmer(farmer_id, Utc::now()).await?;
        trace!("🔄️🤝️ {} pending matches for farmer {farmer_id}", matches.len());
        Ok(matches)
    }

    async fn fetch(&self, match_id: MatchId) -> Result<Match, MatchLifecycleError> {
        self.db.fetch_match(match_id).await?.ok_or(MatchLifecycleError::NotFound(match_id))
    }
}
