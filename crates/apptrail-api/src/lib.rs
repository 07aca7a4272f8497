//! apptrail-api — read-only HTTP API for AppTrail.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/workloads` | List tracked workloads and their versions |
//! | GET | `/api/v1/workloads/{namespace}/{name}` | Get one workload |
//! | GET | `/healthz` | Liveness |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use axum::Router;
use axum::routing::get;

use apptrail_metrics::VersionGauge;
use apptrail_tracker::VersionStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: VersionStore,
    pub gauge: VersionGauge,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/workloads", get(handlers::list_workloads))
        .route("/workloads/{namespace}/{name}", get(handlers::get_workload))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
}
