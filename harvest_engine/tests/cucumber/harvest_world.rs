use cucumber::World;
use harvest_engine::{
    db_types::MatchId,
    events::EventProducers,
    MatchLifecycleApi,
    MatchLifecycleError,
    OrderLifecycleApi,
    OrderLifecycleError,
    SqliteDatabase,
    TransactionApi,
};
use log::*;

use crate::support::prepare_test_env;

#[derive(Default, Debug, World)]
pub struct HarvestWorld {
    pub system: Option<HarvestSystem>,
    pub last_match: Option<MatchId>,
    pub last_error: Option<String>,
    pub last_sweep: Option<usize>,
}

#[derive(Debug)]
pub struct HarvestSystem {
    pub db: SqliteDatabase,
    pub orders: OrderLifecycleApi<SqliteDatabase>,
    pub matches: MatchLifecycleApi<SqliteDatabase>,
    pub transactions: TransactionApi<SqliteDatabase>,
}

impl HarvestWorld {
    pub fn system(&self) -> &HarvestSystem {
        self.system.as_ref().expect("Harvest system not initialised")
    }

    pub fn last_match(&self) -> MatchId {
        self.last_match.expect("No match has been created yet")
    }

    pub fn record_order_error(&mut self, e: OrderLifecycleError) {
        let kind = match e {
            OrderLifecycleError::NotFound(_) => "not found",
            OrderLifecycleError::AlreadyInStatus { .. } => "already in status",
            OrderLifecycleError::InvalidTransition { .. } => "invalid transition",
            OrderLifecycleError::Unauthorized { .. } => "unauthorized",
            OrderLifecycleError::OrderAlreadyExists(_) => "already exists",
            OrderLifecycleError::InvalidArgument(_) => "invalid argument",
            OrderLifecycleError::DatabaseError(_) => "database error",
        };
        debug!("🚀️ Order operation failed ({kind}): {e}");
        self.last_error = Some(kind.to_string());
    }

    pub fn record_match_error(&mut self, e: MatchLifecycleError) {
        let kind = match e {
            MatchLifecycleError::NotFound(_) => "not found",
            MatchLifecycleError::NoLongerPending { .. } => "no longer pending",
            MatchLifecycleError::Expired { .. } => "expired",
            MatchLifecycleError::NotRejectable { .. } => "not rejectable",
            MatchLifecycleError::Unauthorized { .. } => "unauthorized",
            MatchLifecycleError::OrderConflict(_) => "order conflict",
            MatchLifecycleError::InvalidArgument(_) => "invalid argument",
            MatchLifecycleError::DatabaseError(_) => "database error",
        };
        debug!("🚀️ Match operation failed ({kind}): {e}");
        self.last_error = Some(kind.to_string());
    }
}

impl HarvestSystem {
    pub async fn new() -> Self {
        let db = prepare_test_env().await;
        let orders = OrderLifecycleApi::new(db.clone(), EventProducers::default());
        let matches = MatchLifecycleApi::new(db.clone());
        let transactions = TransactionApi::new(db.clone());
        Self { db, orders, matches, transactions }
    }
}
