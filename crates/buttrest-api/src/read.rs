//! Bounded-latency sensor reads

use std::time::Duration;

use buttrest_core::{DeviceClient, Number};
use chrono::{DateTime, Utc};

use crate::error::ApiError;

/// A completed sensor reading
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub values: Vec<Number>,
    /// UTC instant at which the read completed
    pub captured_at: DateTime<Utc>,
}

/// Read one sensor, giving up after `timeout`.
///
/// On timeout the pending read is dropped and nothing partial is returned.
pub async fn read_sensor(
    client: &dyn DeviceClient,
    device_id: u32,
    sensor_id: u32,
    timeout: Duration,
) -> Result<Reading, ApiError> {
    match tokio::time::timeout(timeout, client.read_sensor(device_id, sensor_id)).await {
        Ok(Ok(values)) => Ok(Reading {
            values,
            captured_at: Utc::now(),
        }),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => {
            tracing::warn!(device_id, sensor_id, ?timeout, "Sensor read timed out");
            Err(ApiError::ReadTimeout(timeout))
        }
    }
}
