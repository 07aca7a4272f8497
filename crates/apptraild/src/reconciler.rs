//! Deployment watch binding.
//!
//! Runs a kube-runtime controller over Deployments. Each reconcile reads
//! the workload's version label, feeds it to the detector, and enqueues
//! any resulting update for notification. Deleted or vanished objects
//! never reach the reconciler, so "not found" is a no-op.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, ResourceExt};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use apptrail_core::WorkloadIdentity;
use apptrail_notify::{EnqueueOutcome, UpdateSender};
use apptrail_tracker::{Observation, VersionDetector};

/// Delay before retrying a failed reconcile.
const ERROR_REQUEUE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("deployment {0} has no namespace")]
    MissingNamespace(String),
}

/// Shared state handed to every reconcile.
pub struct ReconcileContext {
    pub detector: VersionDetector,
    pub updates: UpdateSender,
    pub version_label: String,
}

impl ReconcileContext {
    /// Observe one workload and enqueue the update it produces, if any.
    pub async fn handle(
        &self,
        identity: &WorkloadIdentity,
        labels: &BTreeMap<String, String>,
    ) -> Observation {
        let declared = labels.get(&self.version_label).map(String::as_str);
        if declared.is_none() {
            debug!(workload = %identity, label = %self.version_label, "deployment version label not found");
        }

        let observation = self.detector.observe(identity, declared).await;
        if let Some(update) = &observation.update {
            if self.updates.enqueue(update.clone()) == EnqueueOutcome::Queued {
                debug!(workload = %identity, "version update queued for notification");
            }
        }
        observation
    }
}

pub(crate) async fn reconcile(
    deployment: Arc<Deployment>,
    ctx: Arc<ReconcileContext>,
) -> Result<Action, ReconcileError> {
    let name = deployment.name_any();
    let namespace = deployment
        .namespace()
        .ok_or_else(|| ReconcileError::MissingNamespace(name.clone()))?;

    debug!(%namespace, %name, "reconciling deployment");
    let identity = WorkloadIdentity::new(namespace, name);
    ctx.handle(&identity, deployment.labels()).await;

    Ok(Action::await_change())
}

pub(crate) fn error_policy(
    deployment: Arc<Deployment>,
    error: &ReconcileError,
    _ctx: Arc<ReconcileContext>,
) -> Action {
    warn!(name = %deployment.name_any(), error = %error, "reconcile failed");
    Action::requeue(ERROR_REQUEUE)
}

/// Watch Deployments until `shutdown` fires.
///
/// Watches every namespace unless `namespace` is set.
pub async fn run_controller(
    client: Client,
    namespace: Option<String>,
    ctx: Arc<ReconcileContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    let deployments: Api<Deployment> = match namespace.as_deref() {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };
    info!(
        namespace = namespace.as_deref().unwrap_or("*"),
        label = %ctx.version_label,
        "deployment controller starting"
    );

    Controller::new(deployments, watcher::Config::default())
        .graceful_shutdown_on(async move {
            let _ = shutdown.changed().await;
        })
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(deployment = %object, "reconciled"),
                Err(e) => warn!(error = %e, "deployment controller error"),
            }
        })
        .await;

    info!("deployment controller stopped");
}
