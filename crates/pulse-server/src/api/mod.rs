//! HTTP surface.
//!
//! ## Endpoints
//!
//! - `GET /` - HTML dashboard for a fresh reading
//! - `GET /api/data` - the same reading as JSON
//! - `GET /health` - service status and cycle counters
//! - `GET /static/*` - optional static assets

pub mod error;
pub mod handlers;
pub mod view;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

use crate::monitor::{BusyPolicy, VitalsMonitor};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<VitalsMonitor>,
    pub busy_policy: BusyPolicy,
    pub started: Instant,
}

impl AppState {
    pub fn new(monitor: Arc<VitalsMonitor>, busy_policy: BusyPolicy) -> Self {
        Self {
            monitor,
            busy_policy,
            started: Instant::now(),
        }
    }
}

/// Build the router. `static_dir`, when given, is served under `/static`.
pub fn create_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/api/data", get(handlers::api_data))
        .route("/health", get(handlers::health));

    let router = match static_dir {
        Some(dir) => router.nest_service("/static", ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
