//! End-to-end version pipeline tests.
//!
//! Drives the detector the way the reconciler does, pushes updates through
//! the notification queue to recording backends, and checks what the HTTP
//! API exposes afterwards.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use apptrail_api::{ApiState, build_router};
use apptrail_core::{WorkloadIdentity, WorkloadKind, WorkloadUpdate};
use apptrail_metrics::VersionGauge;
use apptrail_notify::{EnqueueOutcome, Notifier, NotifierQueue, NotifyError, UpdateSender};
use apptrail_tracker::{VersionDetector, VersionStore};

struct Recorder {
    name: &'static str,
    seen: Mutex<Vec<WorkloadUpdate>>,
}

impl Recorder {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<WorkloadUpdate> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    async fn notify(&self, update: &WorkloadUpdate) -> Result<(), NotifyError> {
        self.seen.lock().unwrap().push(update.clone());
        Ok(())
    }
}

struct Broken;

#[async_trait]
impl Notifier for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    async fn notify(&self, _update: &WorkloadUpdate) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected {
            status: 503,
            body: "channel unavailable".to_string(),
        })
    }
}

struct Pipeline {
    store: VersionStore,
    gauge: VersionGauge,
    detector: VersionDetector,
    updates: UpdateSender,
    queue: NotifierQueue,
}

fn pipeline(notifiers: Vec<Arc<dyn Notifier>>) -> Pipeline {
    let store = VersionStore::new();
    let gauge = VersionGauge::new();
    let detector = VersionDetector::new(store.clone(), gauge.clone());
    let (queue, updates) = NotifierQueue::new(notifiers, 64, Duration::from_secs(5));
    Pipeline {
        store,
        gauge,
        detector,
        updates,
        queue,
    }
}

/// Observe a version and enqueue any update, as the reconciler does.
async fn observe(p: &Pipeline, identity: &WorkloadIdentity, version: &str) {
    let observation = p.detector.observe(identity, Some(version)).await;
    if let Some(update) = observation.update {
        assert_eq!(p.updates.enqueue(update), EnqueueOutcome::Queued);
    }
}

/// Drop the producer and run the queue until it has drained.
async fn drain(p: Pipeline) -> (VersionStore, VersionGauge) {
    let Pipeline {
        store,
        gauge,
        detector,
        updates,
        queue,
    } = p;
    drop(detector);
    drop(updates);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    queue.run(shutdown_rx).await;
    (store, gauge)
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn rollout_is_announced_once_to_every_backend() {
    let slack = Recorder::new("slack");
    let log = Recorder::new("log");
    let p = pipeline(vec![
        slack.clone() as Arc<dyn Notifier>,
        log.clone() as Arc<dyn Notifier>,
    ]);
    let api = WorkloadIdentity::new("default", "api");

    observe(&p, &api, "1.0.0").await;
    let record = p.store.get(&api).await.unwrap();
    assert_eq!(record.previous_version, "");
    assert_eq!(record.current_version, "1.0.0");

    observe(&p, &api, "1.1.0").await;
    let record = p.store.get(&api).await.unwrap();
    assert_eq!(record.previous_version, "1.0.0");
    assert_eq!(record.current_version, "1.1.0");

    drain(p).await;

    let expected = WorkloadUpdate {
        kind: WorkloadKind::Deployment,
        name: "api".to_string(),
        namespace: "default".to_string(),
        previous_version: "1.0.0".to_string(),
        current_version: "1.1.0".to_string(),
    };
    assert_eq!(slack.seen(), vec![expected.clone()]);
    assert_eq!(log.seen(), vec![expected]);
}

#[tokio::test]
async fn resync_of_unchanged_version_is_silent() {
    let recorder = Recorder::new("recorder");
    let p = pipeline(vec![recorder.clone() as Arc<dyn Notifier>]);
    let api = WorkloadIdentity::new("default", "api");

    for _ in 0..5 {
        observe(&p, &api, "1.0.0").await;
    }
    let (_, gauge) = drain(p).await;

    assert!(recorder.seen().is_empty());
    assert_eq!(gauge.series_count().await, 1);
}

#[tokio::test]
async fn broken_backend_does_not_starve_others() {
    let recorder = Recorder::new("recorder");
    let p = pipeline(vec![
        Arc::new(Broken) as Arc<dyn Notifier>,
        recorder.clone() as Arc<dyn Notifier>,
    ]);
    let api = WorkloadIdentity::new("default", "api");

    observe(&p, &api, "1.0.0").await;
    observe(&p, &api, "1.1.0").await;
    observe(&p, &api, "1.2.0").await;
    drain(p).await;

    let versions: Vec<String> = recorder
        .seen()
        .into_iter()
        .map(|u| u.current_version)
        .collect();
    assert_eq!(versions, vec!["1.1.0", "1.2.0"]);
}

#[tokio::test]
async fn updates_arrive_in_order_across_workloads() {
    let recorder = Recorder::new("recorder");
    let p = pipeline(vec![recorder.clone() as Arc<dyn Notifier>]);
    let api = WorkloadIdentity::new("default", "api");
    let worker = WorkloadIdentity::new("jobs", "worker");

    observe(&p, &api, "1").await;
    observe(&p, &worker, "a").await;
    observe(&p, &worker, "b").await;
    observe(&p, &api, "2").await;
    observe(&p, &worker, "c").await;
    drain(p).await;

    let seen: Vec<String> = recorder
        .seen()
        .into_iter()
        .map(|u| format!("{}:{}", u.name, u.current_version))
        .collect();
    assert_eq!(seen, vec!["worker:b", "api:2", "worker:c"]);
}

#[tokio::test]
async fn api_exposes_records_and_metric_series() {
    let p = pipeline(Vec::new());
    let api = WorkloadIdentity::new("default", "api");
    observe(&p, &api, "1.0.0").await;
    observe(&p, &api, "1.1.0").await;

    let router = build_router(ApiState {
        store: p.store.clone(),
        gauge: p.gauge.clone(),
    });

    let req = Request::builder()
        .uri("/api/v1/workloads/default/api")
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["previous_version"], "1.0.0");
    assert_eq!(json["data"]["current_version"], "1.1.0");

    let req = Request::builder()
        .uri("/api/v1/workloads")
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_string(resp).await;
    assert!(text.contains("# TYPE apptrail_app_version gauge"));
    assert!(text.contains("previous_version=\"\",current_version=\"1.0.0\""));
    assert!(text.contains("previous_version=\"1.0.0\",current_version=\"1.1.0\""));

    let req = Request::builder()
        .uri("/api/v1/workloads/default/missing")
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    drain(p).await;
}
