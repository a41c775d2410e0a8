//! Device registry adapter
//!
//! Index-addressed, bounds-checked lookups over the client's current
//! device list. Nothing is cached: each call re-reads the client so a
//! re-scan that grows or shrinks the registry shows up as either the
//! resource or a not-found for the requested index.

use buttrest_core::{ActuatorInfo, ActuatorKind, DeviceClient, DeviceInfo, SensorInfo};

use crate::error::{ApiError, Resource};
use crate::lifecycle::Lifecycle;

pub struct Registry<'a> {
    client: &'a dyn DeviceClient,
    lifecycle: &'a Lifecycle,
}

impl<'a> Registry<'a> {
    pub(crate) fn new(client: &'a dyn DeviceClient, lifecycle: &'a Lifecycle) -> Self {
        Self { client, lifecycle }
    }

    /// The client, provided the lifecycle is ready and the client still
    /// reports a live connection
    pub fn client(&self) -> Result<&'a dyn DeviceClient, ApiError> {
        if !self.lifecycle.is_ready() || !self.client.is_connected() {
            return Err(ApiError::NotConnected);
        }
        Ok(self.client)
    }

    pub fn devices(&self) -> Result<Vec<DeviceInfo>, ApiError> {
        Ok(self.client()?.devices())
    }

    pub fn device(&self, device_id: u32) -> Result<DeviceInfo, ApiError> {
        self.client()?
            .devices()
            .into_iter()
            .nth(device_id as usize)
            .ok_or(ApiError::NotFound {
                resource: Resource::Device,
                id: device_id,
            })
    }

    pub fn sensor(&self, device_id: u32, sensor_id: u32) -> Result<SensorInfo, ApiError> {
        self.device(device_id)?
            .sensors
            .into_iter()
            .nth(sensor_id as usize)
            .ok_or(ApiError::NotFound {
                resource: Resource::Sensor,
                id: sensor_id,
            })
    }

    pub fn actuator_of(
        &self,
        device_id: u32,
        kind: ActuatorKind,
        actuator_id: u32,
    ) -> Result<ActuatorInfo, ApiError> {
        let device = self.device(device_id)?;
        device
            .actuators_of(kind)
            .get(actuator_id as usize)
            .cloned()
            .ok_or(ApiError::NotFound {
                resource: Resource::Actuator(kind),
                id: actuator_id,
            })
    }

    pub fn actuator(&self, device_id: u32, actuator_id: u32) -> Result<ActuatorInfo, ApiError> {
        self.actuator_of(device_id, ActuatorKind::Scalar, actuator_id)
    }

    pub fn linear_actuator(
        &self,
        device_id: u32,
        actuator_id: u32,
    ) -> Result<ActuatorInfo, ApiError> {
        self.actuator_of(device_id, ActuatorKind::Linear, actuator_id)
    }

    pub fn rotatory_actuator(
        &self,
        device_id: u32,
        actuator_id: u32,
    ) -> Result<ActuatorInfo, ApiError> {
        self.actuator_of(device_id, ActuatorKind::Rotatory, actuator_id)
    }
}

/// Parse a path segment as an index of `resource`.
///
/// Anything that is not a non-negative integer cannot name a resource and
/// is reported as not-found for that category.
pub fn parse_index(resource: Resource, raw: &str) -> Result<u32, ApiError> {
    raw.parse::<u32>().map_err(|_| ApiError::InvalidId {
        resource,
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use buttrest_core::MockClient;

    use super::*;

    async fn ready_client() -> (Arc<MockClient>, Lifecycle) {
        let client = Arc::new(MockClient::demo("test"));
        let lifecycle = Lifecycle::new();
        lifecycle.startup(client.clone(), Duration::ZERO).await.unwrap();
        (client, lifecycle)
    }

    #[tokio::test]
    async fn lookup_resolves_in_range_indices() {
        let (client, lifecycle) = ready_client().await;
        let registry = Registry::new(client.as_ref(), &lifecycle);

        assert_eq!(registry.device(1).unwrap().name, "Simulated Stroker");
        assert_eq!(registry.sensor(0, 0).unwrap().sensor_type, "Battery");
        assert_eq!(registry.actuator(0, 1).unwrap().description, "Outer Motor");
        assert_eq!(registry.linear_actuator(1, 0).unwrap().actuator_type, "Position");
        assert_eq!(registry.rotatory_actuator(2, 0).unwrap().description, "Rotator");
    }

    #[tokio::test]
    async fn out_of_range_is_not_found_with_offending_id() {
        let (client, lifecycle) = ready_client().await;
        let registry = Registry::new(client.as_ref(), &lifecycle);

        assert!(matches!(
            registry.device(99),
            Err(ApiError::NotFound {
                resource: Resource::Device,
                id: 99
            })
        ));
        assert!(matches!(
            registry.sensor(2, 0),
            Err(ApiError::NotFound {
                resource: Resource::Sensor,
                id: 0
            })
        ));
        assert!(matches!(
            registry.rotatory_actuator(0, 0),
            Err(ApiError::NotFound {
                resource: Resource::Actuator(ActuatorKind::Rotatory),
                id: 0
            })
        ));
    }

    #[tokio::test]
    async fn missing_parent_device_wins_over_child_lookup() {
        let (client, lifecycle) = ready_client().await;
        let registry = Registry::new(client.as_ref(), &lifecycle);

        assert!(matches!(
            registry.linear_actuator(7, 99),
            Err(ApiError::NotFound {
                resource: Resource::Device,
                id: 7
            })
        ));
    }

    #[tokio::test]
    async fn shrinking_registry_yields_not_found() {
        let (client, lifecycle) = ready_client().await;
        let registry = Registry::new(client.as_ref(), &lifecycle);
        assert!(registry.device(2).is_ok());

        client.remove_device(0);

        assert!(matches!(
            registry.device(2),
            Err(ApiError::NotFound { id: 2, .. })
        ));
        assert_eq!(registry.device(1).unwrap().name, "Simulated Rotator");
    }

    #[tokio::test]
    async fn disconnected_client_is_not_connected() {
        let (client, lifecycle) = ready_client().await;
        client.set_connected(false);
        let registry = Registry::new(client.as_ref(), &lifecycle);

        assert!(matches!(registry.devices(), Err(ApiError::NotConnected)));
        assert!(matches!(registry.device(0), Err(ApiError::NotConnected)));
    }

    #[tokio::test]
    async fn lookups_require_ready_lifecycle() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        let lifecycle = Lifecycle::new();
        let registry = Registry::new(&client, &lifecycle);

        assert!(matches!(registry.client(), Err(ApiError::NotConnected)));
    }

    #[test]
    fn parse_index_rejects_non_indices() {
        assert_eq!(parse_index(Resource::Device, "12").unwrap(), 12);
        assert!(matches!(
            parse_index(Resource::Sensor, "-1"),
            Err(ApiError::InvalidId {
                resource: Resource::Sensor,
                ..
            })
        ));
        assert!(parse_index(Resource::Device, "abc").is_err());
    }
}
