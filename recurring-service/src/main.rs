use ops_core::error::AppError;
use ops_core::observability::init_tracing;
use recurring_service::config::RecurringConfig;
use recurring_service::services::clock::{Clock, SystemClock};
use recurring_service::services::metrics::init_metrics;
use recurring_service::services::store::{DocumentStore, PgStore};
use recurring_service::workers::RecurrenceScheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = RecurringConfig::load()?;
    init_tracing(&config.service_name, &config.log_level);
    init_metrics();

    let store = PgStore::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    store.run_migrations().await?;
    store.health_check().await?;

    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduler = RecurrenceScheduler::new(
        store,
        clock,
        config.scheduler.batch_size,
        config.scheduler.due_term_days,
    );

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.scheduler.tick_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(
        tick_interval_secs = config.scheduler.tick_interval_secs,
        "Recurrence trigger started"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = interval.tick() => {
                // Each tick is awaited to completion, so a slow pass can
                // never overlap the next one.
                scheduler.tick().await;
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
