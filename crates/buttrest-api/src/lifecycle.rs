//! Client lifecycle: connect, discovery window, readiness, shutdown
//!
//! ```text
//! Disconnected ──startup()──▶ Connecting ──▶ Scanning ──▶ Ready
//!      ▲                          │              │           │
//!      └──────── failure ─────────┴──────────────┘           │
//!      └────────────────────── shutdown() ───────────────────┘
//! ```
//!
//! A runtime re-scan runs the discovery window again without leaving
//! `Ready`, so requests already reading the registry are not blocked.
//!
//! The window itself runs in a spawned task. A caller that goes away
//! mid-window (an HTTP client hanging up on `POST /scan`) stops waiting,
//! but the scan is still stopped when the window ends.

use std::sync::Arc;
use std::time::Duration;

use buttrest_core::{ClientError, ClientResult, DeviceClient};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;

/// Lifecycle state of the application's client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Disconnected,
    Connecting,
    Scanning,
    Ready,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Disconnected => "disconnected",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Scanning => "scanning",
            LifecycleState::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// Lifecycle state machine
pub struct Lifecycle {
    state: RwLock<LifecycleState>,
    /// Serializes discovery windows; never held by readers
    scan_lock: Arc<Mutex<()>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LifecycleState::Disconnected),
            scan_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    fn transition(&self, to: LifecycleState) {
        let from = std::mem::replace(&mut *self.state.write(), to);
        if from != to {
            tracing::info!(%from, %to, "Lifecycle transition");
        }
    }

    /// Connect, hold a discovery window open, then become ready.
    ///
    /// Any failure leaves the lifecycle `Disconnected` and the client
    /// disconnected.
    pub async fn startup(&self, client: Arc<dyn DeviceClient>, window: Duration) -> ClientResult<()> {
        self.transition(LifecycleState::Connecting);
        if let Err(e) = client.connect().await {
            self.transition(LifecycleState::Disconnected);
            return Err(e);
        }

        self.transition(LifecycleState::Scanning);
        if let Err(e) = self.scan_window(client.clone(), window).await {
            tracing::warn!(error = %e, "Discovery window failed");
            self.shutdown(client.as_ref()).await;
            return Err(e);
        }

        self.transition(LifecycleState::Ready);
        tracing::info!(
            devices = client.devices().len(),
            "Registered devices after discovery window"
        );
        Ok(())
    }

    /// Run another discovery window while staying `Ready`
    pub async fn rescan(&self, client: Arc<dyn DeviceClient>, window: Duration) -> ClientResult<()> {
        self.scan_window(client.clone(), window).await?;
        tracing::info!(devices = client.devices().len(), "Re-scan complete");
        Ok(())
    }

    /// Disconnect unconditionally. Errors are logged, not returned.
    pub async fn shutdown(&self, client: &dyn DeviceClient) {
        self.transition(LifecycleState::Disconnected);
        if let Err(e) = client.disconnect().await {
            tracing::warn!(error = %e, "Disconnect failed");
        }
    }

    /// Start scanning, hold the window, stop scanning. The lock travels
    /// with the task, so the next window waits for this one to close.
    async fn scan_window(&self, client: Arc<dyn DeviceClient>, window: Duration) -> ClientResult<()> {
        let guard = self.scan_lock.clone().lock_owned().await;
        let task = tokio::spawn(async move {
            let _guard = guard;
            client.start_scanning().await?;
            tokio::time::sleep(window).await;
            client.stop_scanning().await
        });

        task.await
            .map_err(|e| ClientError::Protocol(format!("Discovery window task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use buttrest_core::{DeviceInfo, MockClient};

    use super::*;

    const WINDOW: Duration = Duration::from_secs(3);

    #[tokio::test(start_paused = true)]
    async fn startup_reaches_ready_with_announced_devices() {
        let client = Arc::new(MockClient::demo("test"));
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Disconnected);

        lifecycle.startup(client.clone(), WINDOW).await.unwrap();

        assert!(lifecycle.is_ready());
        assert_eq!(client.devices().len(), 3);
        assert!(!client.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn startup_holds_scan_open_for_the_window() {
        let client = Arc::new(MockClient::new("test"));
        let lifecycle = Arc::new(Lifecycle::new());

        let task = {
            let client = client.clone();
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.startup(client, WINDOW).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(lifecycle.state(), LifecycleState::Scanning);
        assert!(client.is_scanning());

        // A device announcing inside the window is admitted
        client.announce(DeviceInfo::new(0, "Late Arrival"));

        task.await.unwrap().unwrap();
        assert!(lifecycle.is_ready());
        assert_eq!(client.devices()[0].name, "Late Arrival");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connect_returns_to_disconnected() {
        let client = Arc::new(MockClient::new("test"));
        client.refuse_connections(true);
        let lifecycle = Lifecycle::new();

        let err = lifecycle.startup(client, WINDOW).await.unwrap_err();

        assert!(matches!(err, ClientError::ConnectionFailed(_)));
        assert_eq!(lifecycle.state(), LifecycleState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_discovery_window_disconnects_the_client() {
        let client = Arc::new(MockClient::demo("test"));
        client.refuse_scanning(true);
        let lifecycle = Lifecycle::new();

        let err = lifecycle.startup(client.clone(), WINDOW).await.unwrap_err();

        assert!(matches!(err, ClientError::Device(_)));
        assert_eq!(lifecycle.state(), LifecycleState::Disconnected);
        assert!(!client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn rescan_stays_ready() {
        let client = Arc::new(MockClient::new("test"));
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.startup(client.clone(), WINDOW).await.unwrap();

        client.announce(DeviceInfo::new(0, "New Toy"));
        let task = {
            let client = client.clone();
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.rescan(client, WINDOW).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(lifecycle.is_ready());
        assert_eq!(client.devices().len(), 1);

        task.await.unwrap().unwrap();
        assert!(!client.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_rescan_still_closes_the_window() {
        let client = Arc::new(MockClient::new("test"));
        let lifecycle = Lifecycle::new();
        lifecycle.startup(client.clone(), WINDOW).await.unwrap();

        // The caller gives up one second into the window
        let abandoned =
            tokio::time::timeout(Duration::from_secs(1), lifecycle.rescan(client.clone(), WINDOW))
                .await;
        assert!(abandoned.is_err());
        assert!(client.is_scanning());

        tokio::time::sleep(WINDOW).await;
        tokio::task::yield_now().await;
        assert!(!client.is_scanning());

        // The next window is not blocked by the abandoned one
        lifecycle.rescan(client.clone(), WINDOW).await.unwrap();
        assert!(!client.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_disconnects() {
        let client = Arc::new(MockClient::demo("test"));
        let lifecycle = Lifecycle::new();
        lifecycle.startup(client.clone(), WINDOW).await.unwrap();

        lifecycle.shutdown(client.as_ref()).await;

        assert_eq!(lifecycle.state(), LifecycleState::Disconnected);
        assert!(!client.is_connected());
    }
}
