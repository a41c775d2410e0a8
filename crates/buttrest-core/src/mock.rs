//! In-memory device client for tests and demo runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::DeviceClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{ActuatorCommand, ActuatorKind, DeviceInfo, Number};

/// A command recorded by [`MockClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    pub device: u32,
    pub actuator: u32,
    pub command: ActuatorCommand,
}

/// Mock device client.
///
/// Devices queued with [`MockClient::with_devices`] or
/// [`MockClient::announce`] join the registry when a scan runs, the way
/// real hardware announces itself during a discovery window.
pub struct MockClient {
    name: String,
    connected: AtomicBool,
    scanning: AtomicBool,
    refuse_connect: AtomicBool,
    refuse_scan: AtomicBool,
    devices: RwLock<Vec<DeviceInfo>>,
    /// Devices that will announce on the next scan
    announcing: RwLock<Vec<DeviceInfo>>,
    readings: RwLock<HashMap<(u32, u32), Vec<Number>>>,
    read_latency: RwLock<Duration>,
    command_error: RwLock<Option<String>>,
    commands: RwLock<Vec<SentCommand>>,
}

impl MockClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connected: AtomicBool::new(false),
            scanning: AtomicBool::new(false),
            refuse_connect: AtomicBool::new(false),
            refuse_scan: AtomicBool::new(false),
            devices: RwLock::new(Vec::new()),
            announcing: RwLock::new(Vec::new()),
            readings: RwLock::new(HashMap::new()),
            read_latency: RwLock::new(Duration::ZERO),
            command_error: RwLock::new(None),
            commands: RwLock::new(Vec::new()),
        }
    }

    /// Queue devices that announce during the first scan
    pub fn with_devices(self, devices: Vec<DeviceInfo>) -> Self {
        self.announcing.write().extend(devices);
        self
    }

    /// A client with a small set of simulated toys
    pub fn demo(name: impl Into<String>) -> Self {
        let client = Self::new(name).with_devices(vec![
            DeviceInfo::new(0, "Simulated Vibrator")
                .with_actuator(ActuatorKind::Scalar, "Inner Motor", "Vibrate", 20)
                .with_actuator(ActuatorKind::Scalar, "Outer Motor", "Vibrate", 20)
                .with_sensor("Battery Level", "Battery", vec![[0, 100]]),
            DeviceInfo::new(0, "Simulated Stroker")
                .with_actuator(ActuatorKind::Linear, "Stroker", "Position", 100)
                .with_sensor("Signal Strength", "RSSI", vec![[-128, 0]]),
            DeviceInfo::new(0, "Simulated Rotator")
                .with_actuator(ActuatorKind::Rotatory, "Rotator", "Rotate", 24)
                .with_actuator(ActuatorKind::Scalar, "Vibe", "Vibrate", 20),
        ]);
        client.set_reading(0, 0, vec![Number::Int(87)]);
        client.set_reading(1, 0, vec![Number::Int(-54)]);
        client
    }

    /// Announce a device. It joins immediately while a scan is running,
    /// otherwise on the next scan.
    pub fn announce(&self, device: DeviceInfo) {
        if self.scanning.load(Ordering::SeqCst) {
            self.admit(device);
        } else {
            self.announcing.write().push(device);
        }
    }

    /// Remove a device by position, shifting later devices down
    pub fn remove_device(&self, index: u32) -> Option<DeviceInfo> {
        let mut devices = self.devices.write();
        if (index as usize) >= devices.len() {
            return None;
        }
        let removed = devices.remove(index as usize);
        for (position, device) in devices.iter_mut().enumerate() {
            device.index = position as u32;
        }
        Some(removed)
    }

    /// Set connection state
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make `connect` fail
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse_connect.store(refuse, Ordering::SeqCst);
    }

    /// Make `start_scanning` fail with a device error
    pub fn refuse_scanning(&self, refuse: bool) {
        self.refuse_scan.store(refuse, Ordering::SeqCst);
    }

    /// Value returned by the next reads of a sensor
    pub fn set_reading(&self, device: u32, sensor: u32, values: Vec<Number>) {
        self.readings.write().insert((device, sensor), values);
    }

    /// Simulated time a sensor read takes
    pub fn set_read_latency(&self, latency: Duration) {
        *self.read_latency.write() = latency;
    }

    /// Make every command fail with a device error
    pub fn fail_commands(&self, message: Option<String>) {
        *self.command_error.write() = message;
    }

    /// Commands received so far
    pub fn sent_commands(&self) -> Vec<SentCommand> {
        self.commands.read().clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    fn admit(&self, mut device: DeviceInfo) {
        let mut devices = self.devices.write();
        device.index = devices.len() as u32;
        tracing::debug!(index = device.index, name = %device.name, "Mock device announced");
        devices.push(device);
    }

    fn ensure_connected(&self) -> ClientResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    fn device(&self, index: u32) -> ClientResult<DeviceInfo> {
        self.devices
            .read()
            .get(index as usize)
            .cloned()
            .ok_or(ClientError::DeviceNotFound(index))
    }
}

#[async_trait]
impl DeviceClient for MockClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> ClientResult<()> {
        if self.refuse_connect.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> ClientResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.scanning.store(false, Ordering::SeqCst);
        self.devices.write().clear();
        Ok(())
    }

    async fn start_scanning(&self) -> ClientResult<()> {
        self.ensure_connected()?;
        if self.refuse_scan.load(Ordering::SeqCst) {
            return Err(ClientError::Device("scanning unavailable".to_string()));
        }
        self.scanning.store(true, Ordering::SeqCst);
        let queued: Vec<DeviceInfo> = self.announcing.write().drain(..).collect();
        for device in queued {
            self.admit(device);
        }
        Ok(())
    }

    async fn stop_scanning(&self) -> ClientResult<()> {
        self.ensure_connected()?;
        self.scanning.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.read().clone()
    }

    async fn send_command(
        &self,
        device: u32,
        actuator: u32,
        command: &ActuatorCommand,
    ) -> ClientResult<()> {
        self.ensure_connected()?;
        let info = self.device(device)?;
        let kind = command.kind();
        if (actuator as usize) >= info.actuators_of(kind).len() {
            return Err(ClientError::Device(format!(
                "{} has no {} with index {}",
                info.name, kind, actuator
            )));
        }
        if let Some(message) = self.command_error.read().clone() {
            return Err(ClientError::Device(message));
        }

        self.commands.write().push(SentCommand {
            device,
            actuator,
            command: *command,
        });
        Ok(())
    }

    async fn read_sensor(&self, device: u32, sensor: u32) -> ClientResult<Vec<Number>> {
        self.ensure_connected()?;
        let info = self.device(device)?;
        if (sensor as usize) >= info.sensors.len() {
            return Err(ClientError::Device(format!(
                "{} has no sensor with index {}",
                info.name, sensor
            )));
        }

        // Simulate latency
        let latency = *self.read_latency.read();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        Ok(self
            .readings
            .read()
            .get(&(device, sensor))
            .cloned()
            .unwrap_or_else(|| vec![Number::Int(0)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn devices_join_during_scan() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        assert!(client.devices().is_empty());

        client.start_scanning().await.unwrap();
        client.stop_scanning().await.unwrap();

        let devices = client.devices();
        assert_eq!(devices.len(), 3);
        for (position, device) in devices.iter().enumerate() {
            assert_eq!(device.index, position as u32);
        }
    }

    #[tokio::test]
    async fn scanning_requires_connection() {
        let client = MockClient::new("test");
        assert_eq!(
            client.start_scanning().await,
            Err(ClientError::NotConnected)
        );
    }

    #[tokio::test]
    async fn removal_reindexes_remaining_devices() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        client.start_scanning().await.unwrap();

        let removed = client.remove_device(0).unwrap();
        assert_eq!(removed.name, "Simulated Vibrator");

        let devices = client.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "Simulated Stroker");
        assert_eq!(devices[0].index, 0);
    }

    #[tokio::test]
    async fn commands_are_recorded() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        client.start_scanning().await.unwrap();

        let command = ActuatorCommand::Scalar { intensity: 0.5 };
        client.send_command(0, 1, &command).await.unwrap();

        assert_eq!(
            client.sent_commands(),
            vec![SentCommand {
                device: 0,
                actuator: 1,
                command
            }]
        );
    }

    #[tokio::test]
    async fn command_to_missing_feature_is_device_error() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        client.start_scanning().await.unwrap();

        let command = ActuatorCommand::Rotate {
            speed: 0.5,
            clockwise: false,
        };
        let err = client.send_command(0, 0, &command).await.unwrap_err();
        assert!(matches!(err, ClientError::Device(_)));
    }

    #[tokio::test]
    async fn disconnect_clears_registry() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        client.start_scanning().await.unwrap();
        client.disconnect().await.unwrap();

        assert!(!client.is_connected());
        assert!(client.devices().is_empty());
        assert_eq!(
            client.read_sensor(0, 0).await,
            Err(ClientError::NotConnected)
        );
    }

    #[tokio::test]
    async fn configured_readings_are_returned() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        client.start_scanning().await.unwrap();

        assert_eq!(client.read_sensor(0, 0).await.unwrap(), vec![Number::Int(87)]);
    }
}
