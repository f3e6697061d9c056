use crate::bootstrap::Services;

/// Stop watching, let the in-flight job finish, then wait for both tasks.
///
/// Jobs still queued when the token fires are not printed.
pub async fn graceful_shutdown(services: Services) {
    tracing::info!("Shutdown sequence started");

    let state = services.state.clone();
    services.shutdown_token.cancel();
    let (ingest, worker) = services.into_tasks();
    tracing::info!("Shutdown: directory watch stopped, background loops cancelled");

    if let Err(e) = ingest.await {
        tracing::error!("Shutdown: ingestion task failed: {e}");
    }

    match worker.await {
        Ok(pipeline) => {
            let stats = pipeline.stats();
            tracing::info!(
                processed = stats.total_processed,
                failed = stats.failed,
                dispatched = state.dispatched_count(),
                "Shutdown: print queue closed"
            );
        }
        Err(e) => tracing::error!("Shutdown: print queue worker failed: {e}"),
    }

    tracing::info!("Shutdown sequence completed");
}
