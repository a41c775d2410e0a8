//! Application state for the REST API

use std::sync::Arc;
use std::time::Duration;

use buttrest_core::{ClientResult, DeviceClient};

use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::registry::Registry;

/// Default discovery window
pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(3);
/// Default sensor read deadline
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Timing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    /// How long a discovery scan stays open
    pub scan_window: Duration,
    /// Deadline for a single sensor read
    pub read_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            scan_window: DEFAULT_SCAN_WINDOW,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Application context shared across all handlers.
///
/// Owns the client handle and its lifecycle state machine; handlers reach
/// the device registry only through [`AppState::registry`].
#[derive(Clone)]
pub struct AppState {
    client: Arc<dyn DeviceClient>,
    lifecycle: Arc<Lifecycle>,
    settings: ApiSettings,
}

impl AppState {
    /// Create a new AppState with default settings
    pub fn new(client: Arc<dyn DeviceClient>) -> Self {
        Self::with_settings(client, ApiSettings::default())
    }

    /// Create a new AppState with explicit timing settings
    pub fn with_settings(client: Arc<dyn DeviceClient>, settings: ApiSettings) -> Self {
        Self {
            client,
            lifecycle: Arc::new(Lifecycle::new()),
            settings,
        }
    }

    /// Bounds-checked view of the client's devices
    pub fn registry(&self) -> Registry<'_> {
        Registry::new(self.client.as_ref(), &self.lifecycle)
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Connect and run the initial discovery window
    pub async fn startup(&self) -> ClientResult<()> {
        self.lifecycle
            .startup(self.client.clone(), self.settings.scan_window)
            .await
    }

    /// Run a discovery window at runtime
    pub async fn rescan(&self) -> ClientResult<()> {
        self.lifecycle
            .rescan(self.client.clone(), self.settings.scan_window)
            .await
    }

    /// Disconnect the client
    pub async fn shutdown(&self) {
        self.lifecycle.shutdown(self.client.as_ref()).await
    }
}
