//! Router assembly.

use crate::api;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use serde_json::json;
use soiree_core::environment::Clock as _;
use tower_http::trace::TraceLayer;

/// `GET /health` — liveness probe.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": state.clock.now().to_rfc3339(),
    }))
}

/// Build the complete router.
///
/// Public surface: health and RSVP. Everything else sits behind the admin
/// session gate, enforced by the `AdminAccess` extractor on each handler.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/rsvp", post(api::rsvp::submit))
        .route("/admin/session", post(api::admin::open_session))
        .route("/guests", get(api::guests::list).post(api::guests::create))
        .route("/guests/export", get(api::export::download))
        .route("/attendance", get(api::attendance::list))
        .route("/checkin", post(api::checkin::resolve))
        .route("/stats", get(api::guests::stats));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
