//! Liveness and readiness

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::lifecycle::LifecycleState;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub state: LifecycleState,
}

/// GET /healthz and GET /
pub async fn liveness() -> &'static str {
    "OK"
}

/// GET /readyz
///
/// Reports the lifecycle state without touching the registry.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let lifecycle = state.lifecycle_state();
    let ready = lifecycle == LifecycleState::Ready;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            state: lifecycle,
        }),
    )
}
