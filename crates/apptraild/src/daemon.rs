//! Daemon assembly — wires the detector, dispatch queue, controller,
//! and HTTP server together and runs them until a shutdown signal.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use apptrail_api::{ApiState, build_router};
use apptrail_core::TrailConfig;
use apptrail_metrics::VersionGauge;
use apptrail_notify::{NotifierQueue, build_notifiers};
use apptrail_tracker::{VersionDetector, VersionStore};

use crate::reconciler::{ReconcileContext, run_controller};

pub async fn run(config: TrailConfig) -> anyhow::Result<()> {
    info!("AppTrail daemon starting");

    // ── Version tracking ───────────────────────────────────────

    let store = VersionStore::new();
    let gauge = VersionGauge::with_warn_threshold(config.metrics.series_warn_threshold);
    let detector = VersionDetector::new(store.clone(), gauge.clone());

    // ── Notification dispatch ──────────────────────────────────

    let notifiers = build_notifiers(&config.notifiers)?;
    if notifiers.is_empty() {
        warn!("no notifiers configured; version changes will only be recorded as metrics");
    }
    let notify_timeout = config.dispatch.notify_timeout()?;
    let (queue, updates) =
        NotifierQueue::new(notifiers, config.dispatch.queue_capacity, notify_timeout);
    info!(
        capacity = config.dispatch.queue_capacity,
        "notification queue initialized"
    );

    // ── Shutdown signals ───────────────────────────────────────

    // The queue is stopped only after the controller so that updates
    // produced by in-flight reconciles are still delivered.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (queue_shutdown_tx, queue_shutdown_rx) = watch::channel(false);

    let queue_handle = tokio::spawn(queue.run(queue_shutdown_rx));

    // ── Deployment controller ──────────────────────────────────

    let client = kube::Client::try_default().await?;
    info!("kubernetes client initialized");

    let ctx = Arc::new(ReconcileContext {
        detector,
        updates,
        version_label: config.watch.version_label.clone(),
    });
    let controller_handle = tokio::spawn(run_controller(
        client,
        config.watch.namespace.clone(),
        ctx,
        shutdown_rx,
    ));

    // ── HTTP server ────────────────────────────────────────────

    let router = build_router(ApiState { store, gauge });
    let addr: SocketAddr = config.server.listen.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Err(e) = controller_handle.await {
        error!(error = %e, "deployment controller task failed");
    }
    let _ = queue_shutdown_tx.send(true);
    if let Err(e) = queue_handle.await {
        error!(error = %e, "notifier queue task failed");
    }

    info!("AppTrail daemon stopped");
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
