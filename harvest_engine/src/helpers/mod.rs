use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::db_types::{MatchId, OrderId};

/// Prefix of the order ids the engine assigns to accepted matches. Caller-seeded orders may not use it.
pub const MATCH_ORDER_PREFIX: &str = "MO-";

/// The order created when a match is accepted. Deterministic, so a retried acceptance can never create a second
/// order for the same match.
pub fn order_id_for_match(id: MatchId) -> OrderId {
    OrderId(format!("{MATCH_ORDER_PREFIX}{:06}", id.value()))
}

/// True if `order_id` is in the namespace reserved for orders created from accepted matches.
pub fn is_match_order_id(order_id: &OrderId) -> bool {
    order_id.as_str().trim().get(..MATCH_ORDER_PREFIX.len()).is_some_and(|p| p.eq_ignore_ascii_case(MATCH_ORDER_PREFIX))
}

/// Midnight UTC on the first day of the month containing `now`.
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).single().unwrap_or(now)
}
