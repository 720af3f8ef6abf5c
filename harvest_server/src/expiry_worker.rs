use std::{sync::Arc, time::Duration};

use harvest_engine::SqliteDatabase;
use log::*;
use tokio::task::JoinHandle;

use crate::service::FarmerService;

/// Starts the match expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Each tick moves every pending match whose offer window has closed to `EXPIRED`, through the same service that
/// handles farmer requests. A failed sweep is logged and retried on the next tick.
pub fn start_expiry_worker(service: Arc<FarmerService<SqliteDatabase>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Match expiry worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            debug!("🕰️ Running match expiry sweep");
            match service.expire_matches().await {
                Ok(result) if result.expired == 0 => trace!("🕰️ No overdue matches"),
                Ok(result) => info!("🕰️ {} matches expired", result.expired),
                Err(e) => error!("🕰️ Error running match expiry sweep: {e}"),
            }
        }
    })
}
