//! Sensor handlers

use axum::extract::{Path, State};
use buttrest_core::links;

use crate::error::{ApiError, Resource};
use crate::read::read_sensor;
use crate::registry::parse_index;
use crate::render::{
    render_sensor, render_sensor_reading, Collection, Document, LdJson, SensorItem,
    SensorReadingItem,
};
use crate::state::AppState;

fn parse_sensor_path(device_id: &str, sensor_id: &str) -> Result<(u32, u32), ApiError> {
    Ok((
        parse_index(Resource::Device, device_id)?,
        parse_index(Resource::Sensor, sensor_id)?,
    ))
}

/// GET /devices/{device_id}/sensors
pub async fn list_sensors(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<LdJson<Collection<SensorItem>>, ApiError> {
    let device_id = parse_index(Resource::Device, &device_id)?;
    let device = state.registry().device(device_id)?;

    Ok(LdJson(Collection::new(
        links::sensors(device_id),
        device
            .sensors
            .iter()
            .map(|s| render_sensor(device_id, s))
            .collect(),
    )))
}

/// GET /devices/{device_id}/sensors/{sensor_id}
pub async fn get_sensor(
    State(state): State<AppState>,
    Path((device_id, sensor_id)): Path<(String, String)>,
) -> Result<LdJson<Document<SensorItem>>, ApiError> {
    let (device_id, sensor_id) = parse_sensor_path(&device_id, &sensor_id)?;
    let sensor = state.registry().sensor(device_id, sensor_id)?;
    Ok(LdJson(Document::new(render_sensor(device_id, &sensor))))
}

/// GET /devices/{device_id}/sensors/{sensor_id}/read
///
/// Bounded by the configured read timeout; a slow sensor yields 504.
pub async fn read_sensor_value(
    State(state): State<AppState>,
    Path((device_id, sensor_id)): Path<(String, String)>,
) -> Result<LdJson<Document<SensorReadingItem>>, ApiError> {
    let (device_id, sensor_id) = parse_sensor_path(&device_id, &sensor_id)?;
    let registry = state.registry();
    let sensor = registry.sensor(device_id, sensor_id)?;

    let reading = read_sensor(
        registry.client()?,
        device_id,
        sensor.index,
        state.settings().read_timeout,
    )
    .await?;

    Ok(LdJson(Document::new(render_sensor_reading(
        device_id,
        sensor.index,
        &reading,
    ))))
}
