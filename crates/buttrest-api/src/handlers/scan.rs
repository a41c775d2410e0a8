//! Runtime discovery

use axum::extract::State;

use crate::error::ApiError;
use crate::handlers::devices::device_collection;
use crate::render::{Collection, DeviceItem, LdJson};
use crate::state::AppState;

/// POST /scan
///
/// Hold another discovery window open, then return the refreshed device
/// list. Concurrent calls queue behind each other.
pub async fn rescan(
    State(state): State<AppState>,
) -> Result<LdJson<Collection<DeviceItem>>, ApiError> {
    state.registry().client()?;

    tracing::info!(window = ?state.settings().scan_window, "Re-scan requested");
    state.rescan().await?;

    device_collection(&state).map(LdJson)
}
