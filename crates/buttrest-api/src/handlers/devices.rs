//! Device handlers

use axum::extract::{Path, State};
use buttrest_core::links;

use crate::error::{ApiError, Resource};
use crate::registry::parse_index;
use crate::render::{render_device, Collection, DeviceItem, Document, LdJson};
use crate::state::AppState;

pub(crate) fn device_collection(state: &AppState) -> Result<Collection<DeviceItem>, ApiError> {
    let devices = state.registry().devices()?;
    Ok(Collection::new(
        links::devices(),
        devices.iter().map(render_device).collect(),
    ))
}

/// GET /devices
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<LdJson<Collection<DeviceItem>>, ApiError> {
    device_collection(&state).map(LdJson)
}

/// GET /devices/{device_id}
pub async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<LdJson<Document<DeviceItem>>, ApiError> {
    let device_id = parse_index(Resource::Device, &device_id)?;
    let device = state.registry().device(device_id)?;
    Ok(LdJson(Document::new(render_device(&device))))
}
