use std::sync::Arc;

use futures::future::BoxFuture;
use harvest_engine::{
    events::{EventHandlers, EventHooks, OrderDelayedEvent, OrderStatusChangedEvent},
    SqliteDatabase,
};
use log::*;

use crate::{config::ServerConfig, errors::ServerError, expiry_worker::start_expiry_worker, service::FarmerService};

/// Opens the database, wires the event handlers and the expiry worker, then runs until Ctrl-C is received.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }

    let handlers = EventHandlers::new(config.event_buffer_size, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers();

    let service = Arc::new(FarmerService::new(db.clone(), producers, config.match_validity));
    info!("🚀️ Service ready. {service:?}");
    let worker = start_expiry_worker(Arc::clone(&service), config.sweep_interval);

    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutdown requested");
    worker.abort();
    // The aborted worker releases its handle on the service once it has unwound.
    if let Err(e) = worker.await {
        trace!("🚀️ Expiry worker stopped. {e}");
    }
    // Dropping the last handle drops the event producers, which lets the handlers drain and stop.
    drop(service);
    db.close().await;
    Ok(())
}

/// Hooks that write every order event to the log.
pub fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_status_changed(|ev: OrderStatusChangedEvent| {
            Box::pin(async move {
                info!(
                    "📬️ Order {} for farmer {} moved from {} to {} by {}",
                    ev.order_id, ev.farmer_id, ev.previous_status, ev.new_status, ev.actor
                );
            }) as BoxFuture<'static, ()>
        })
        .on_order_delayed(|ev: OrderDelayedEvent| {
            Box::pin(async move {
                let reason = ev.reason.as_deref().unwrap_or("no reason given");
                warn!("📬️ Order {} ({}) delayed by {} minutes: {reason}", ev.order_id, ev.status, ev.delay_minutes);
            }) as BoxFuture<'static, ()>
        });
    hooks
}
