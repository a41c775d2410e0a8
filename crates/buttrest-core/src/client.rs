//! DeviceClient trait - the core abstraction over hardware-control backends

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::{ActuatorCommand, DeviceInfo, Number};

/// The trait every hardware-control client implements.
///
/// This abstraction allows the same REST API to be served by different
/// backends:
/// - `IntifaceClient` - an Intiface server spoken to over websocket
/// - `MockClient` - an in-memory simulation for tests and demos
///
/// Indices are positional. `devices()` returns devices ordered so that
/// `devices()[i].index == i`, and feature indices are positions within
/// the device's collection for that feature kind. Implementations keep
/// their own interior synchronization; callers never hold a lock across
/// calls, so every call observes the latest registry state.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Name this client announces to the backend
    fn name(&self) -> &str;

    /// Whether the client currently holds a live connection
    fn is_connected(&self) -> bool;

    /// Connect to the backend and run its handshake
    async fn connect(&self) -> ClientResult<()>;

    /// Disconnect from the backend, dropping all known devices
    async fn disconnect(&self) -> ClientResult<()>;

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Ask the backend to start announcing devices
    async fn start_scanning(&self) -> ClientResult<()>;

    /// Ask the backend to stop announcing devices
    async fn stop_scanning(&self) -> ClientResult<()>;

    /// Snapshot of the currently known devices, in positional order
    fn devices(&self) -> Vec<DeviceInfo>;

    // =========================================================================
    // Device Access
    // =========================================================================

    /// Send a command to one actuator and wait for the backend's
    /// acknowledgment. The actuator collection is selected by the
    /// command's kind.
    async fn send_command(
        &self,
        device: u32,
        actuator: u32,
        command: &ActuatorCommand,
    ) -> ClientResult<()>;

    /// Read one sensor. May wait indefinitely; callers bound it.
    async fn read_sensor(&self, device: u32, sensor: u32) -> ClientResult<Vec<Number>>;
}
