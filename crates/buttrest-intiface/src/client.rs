//! Intiface websocket client
//!
//! One reader task demultiplexes incoming frames: replies go to the
//! request waiting on their `Id`, device events update the device table.
//! One writer task owns the websocket sink. When the server asks for
//! pings, a third task keeps the connection alive.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use buttrest_core::{
    ActuatorCommand, ClientError, ClientResult, DeviceClient, DeviceInfo, Number,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::IntifaceError;
use crate::messages::{
    decode_frame, DeviceEntry, Request, RotationSubcommand, ScalarSubcommand, ServerMessage,
    VectorSubcommand, EVENT_ID, MESSAGE_VERSION,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default deadline for a request/reply exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `disconnect` waits for the close frame to be flushed
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection settings
#[derive(Debug, Clone)]
pub struct IntifaceConfig {
    /// Websocket URL of the Intiface server (ws:// or wss://)
    pub url: String,
    /// Name announced in the handshake
    pub client_name: String,
    /// Deadline for connecting and for each request/reply exchange
    pub request_timeout: Duration,
}

impl IntifaceConfig {
    pub fn new(url: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_name: client_name.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// State shared with the background tasks
struct Shared {
    connected: AtomicBool,
    next_id: AtomicU32,
    pending: Mutex<HashMap<u32, oneshot::Sender<ServerMessage>>>,
    /// Keyed by server device index; iteration order gives positions
    devices: RwLock<BTreeMap<u32, DeviceEntry>>,
    outgoing: RwLock<Option<mpsc::UnboundedSender<Message>>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            next_id: AtomicU32::new(1),
            pending: Mutex::new(HashMap::new()),
            devices: RwLock::new(BTreeMap::new()),
            outgoing: RwLock::new(None),
        }
    }

    fn next_id(&self) -> u32 {
        // Skip the event id on wrap-around
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != EVENT_ID {
                return id;
            }
        }
    }

    fn send(&self, request: &Request) -> Result<(), IntifaceError> {
        let frame = request.to_frame()?;
        tracing::trace!(%frame, "Sending");
        self.outgoing
            .read()
            .as_ref()
            .ok_or(IntifaceError::NotConnected)?
            .send(Message::Text(frame))
            .map_err(|_| IntifaceError::Closed)
    }

    fn handle_frame(&self, text: &str) {
        let messages = match decode_frame(text) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed frame");
                return;
            }
        };

        for message in messages {
            match message {
                Ok(message) => self.handle_message(message),
                Err(e) => tracing::debug!(error = %e, "Ignoring unsupported message"),
            }
        }
    }

    fn handle_message(&self, message: ServerMessage) {
        match message {
            ServerMessage::DeviceAdded(entry) => {
                tracing::info!(
                    index = entry.device_index,
                    name = %entry.device_name,
                    "Device added"
                );
                self.devices.write().insert(entry.device_index, entry);
            }
            ServerMessage::DeviceRemoved { device_index, .. } => {
                if let Some(entry) = self.devices.write().remove(&device_index) {
                    tracing::info!(index = device_index, name = %entry.device_name, "Device removed");
                }
            }
            ServerMessage::ScanningFinished { .. } => {
                tracing::debug!("Server finished scanning");
            }
            ServerMessage::Error {
                id: EVENT_ID,
                error_message,
                error_code,
            } => {
                tracing::warn!(code = error_code, message = %error_message, "Server error");
            }
            reply => {
                let id = reply.id();
                match self.pending.lock().remove(&id) {
                    Some(waiter) => {
                        let _ = waiter.send(reply);
                    }
                    None => tracing::trace!(id, "Reply with no waiting request"),
                }
            }
        }
    }

    /// Drop everything tied to the current connection
    fn reset(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.outgoing.write().take();
        self.devices.write().clear();
        // Dropping the senders wakes every waiter with `Closed`
        self.pending.lock().clear();
    }
}

/// Removes a pending entry if its request is abandoned
struct PendingGuard<'a> {
    shared: &'a Shared,
    id: u32,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.pending.lock().remove(&self.id);
    }
}

/// Client for an Intiface server
pub struct IntifaceClient {
    config: IntifaceConfig,
    shared: Arc<Shared>,
    /// Owns the sink; ends once the outgoing sender is dropped
    writer: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl IntifaceClient {
    pub fn new(config: IntifaceConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            writer: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &IntifaceConfig {
        &self.config
    }

    /// Send a request and wait for the reply carrying its id
    async fn request(&self, request: Request) -> Result<ServerMessage, IntifaceError> {
        let id = request.id();
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(id, tx);
        let _guard = PendingGuard {
            shared: &self.shared,
            id,
        };

        self.shared.send(&request)?;

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(ServerMessage::Error {
                error_message,
                error_code,
                ..
            })) => Err(IntifaceError::Server {
                code: error_code,
                message: error_message,
            }),
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(IntifaceError::Closed),
            Err(_) => {
                tracing::warn!(id, request = request.name(), "Request timed out");
                Err(IntifaceError::Timeout)
            }
        }
    }

    /// Send a request that the server acknowledges with `Ok`
    async fn expect_ok(&self, request: Request) -> Result<(), IntifaceError> {
        let name = request.name();
        match self.request(request).await? {
            ServerMessage::Ok { .. } => Ok(()),
            other => Err(unexpected(name, &other)),
        }
    }

    fn next_id(&self) -> u32 {
        self.shared.next_id()
    }

    async fn handshake(&self) -> Result<(), IntifaceError> {
        let reply = self
            .request(Request::RequestServerInfo {
                id: self.next_id(),
                client_name: self.config.client_name.clone(),
                message_version: MESSAGE_VERSION,
            })
            .await?;

        let ServerMessage::ServerInfo {
            server_name,
            message_version,
            max_ping_time,
            ..
        } = reply
        else {
            return Err(unexpected("RequestServerInfo", &reply));
        };
        tracing::info!(
            server = server_name.as_deref().unwrap_or("unknown"),
            message_version,
            max_ping_time,
            "Connected to Intiface server"
        );

        if max_ping_time > 0 {
            let shared = self.shared.clone();
            let period = Duration::from_millis(max_ping_time / 2).max(Duration::from_millis(10));
            self.tasks
                .lock()
                .push(tokio::spawn(ping_loop(shared, period)));
        }

        let reply = self
            .request(Request::RequestDeviceList { id: self.next_id() })
            .await?;
        let ServerMessage::DeviceList { devices, .. } = reply else {
            return Err(unexpected("RequestDeviceList", &reply));
        };
        tracing::debug!(count = devices.len(), "Initial device list");
        self.shared
            .devices
            .write()
            .extend(devices.into_iter().map(|entry| (entry.device_index, entry)));
        Ok(())
    }

    fn stop_tasks(&self) {
        if let Some(writer) = self.writer.lock().take() {
            writer.abort();
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    fn ensure_connected(&self) -> ClientResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }

    /// The server entry at a registry position
    fn entry_at(&self, position: u32) -> ClientResult<DeviceEntry> {
        self.shared
            .devices
            .read()
            .values()
            .nth(position as usize)
            .cloned()
            .ok_or(ClientError::DeviceNotFound(position))
    }
}

fn unexpected(request: &'static str, reply: &ServerMessage) -> IntifaceError {
    IntifaceError::UnexpectedResponse {
        request,
        response: format!("{:?}", reply),
    }
}

fn missing_feature(entry: &DeviceEntry, feature: &str, index: u32) -> ClientError {
    ClientError::Device(format!(
        "{} has no {} with index {}",
        entry.device_name, feature, index
    ))
}

async fn read_loop(shared: Arc<Shared>, mut read: SplitStream<WsStream>) {
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => shared.handle_frame(&text),
            Ok(Message::Close(_)) => {
                tracing::info!("Server closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Websocket read failed");
                break;
            }
        }
    }
    shared.reset();
}

async fn write_loop(mut write: SplitSink<WsStream, Message>, mut rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = write.send(message).await {
            tracing::warn!(error = %e, "Websocket write failed");
            break;
        }
    }
    let _ = write.close().await;
}

async fn ping_loop(shared: Arc<Shared>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let id = shared.next_id();
        if shared.send(&Request::Ping { id }).is_err() {
            break;
        }
    }
}

#[async_trait]
impl DeviceClient for IntifaceClient {
    fn name(&self) -> &str {
        &self.config.client_name
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> ClientResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        tracing::info!(url = %self.config.url, "Connecting to Intiface server");
        let stream = match tokio::time::timeout(
            self.config.request_timeout,
            connect_async(self.config.url.as_str()),
        )
        .await
        {
            Ok(Ok((stream, _))) => stream,
            Ok(Err(e)) => return Err(ClientError::ConnectionFailed(e.to_string())),
            Err(_) => {
                return Err(ClientError::ConnectionFailed(format!(
                    "Timed out connecting to {}",
                    self.config.url
                )))
            }
        };

        let (write, read) = stream.split();
        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.outgoing.write() = Some(tx);
        *self.writer.lock() = Some(tokio::spawn(write_loop(write, rx)));
        self.tasks
            .lock()
            .push(tokio::spawn(read_loop(self.shared.clone(), read)));

        if let Err(e) = self.handshake().await {
            self.stop_tasks();
            self.shared.reset();
            return Err(ClientError::ConnectionFailed(e.to_string()));
        }

        self.shared.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> ClientResult<()> {
        // Dropping the outgoing sender ends the writer, which flushes what
        // is queued and closes the sink with a close frame
        self.shared.reset();
        let writer = self.writer.lock().take();
        if let Some(mut writer) = writer {
            if tokio::time::timeout(CLOSE_TIMEOUT, &mut writer).await.is_err() {
                tracing::debug!("Close frame not flushed in time");
                writer.abort();
            }
        }
        self.stop_tasks();
        tracing::info!("Disconnected from Intiface server");
        Ok(())
    }

    async fn start_scanning(&self) -> ClientResult<()> {
        self.ensure_connected()?;
        self.expect_ok(Request::StartScanning { id: self.next_id() })
            .await?;
        tracing::debug!("Scanning started");
        Ok(())
    }

    async fn stop_scanning(&self) -> ClientResult<()> {
        self.ensure_connected()?;
        self.expect_ok(Request::StopScanning { id: self.next_id() })
            .await?;
        tracing::debug!("Scanning stopped");
        Ok(())
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        self.shared
            .devices
            .read()
            .values()
            .enumerate()
            .map(|(position, entry)| entry.to_device_info(position as u32))
            .collect()
    }

    async fn send_command(
        &self,
        device: u32,
        actuator: u32,
        command: &ActuatorCommand,
    ) -> ClientResult<()> {
        self.ensure_connected()?;
        let entry = self.entry_at(device)?;
        let device_index = entry.device_index;
        let messages = &entry.device_messages;

        let id = self.next_id();
        let request = match *command {
            ActuatorCommand::Scalar { intensity } => {
                let attributes = messages
                    .scalar_cmd
                    .get(actuator as usize)
                    .ok_or_else(|| missing_feature(&entry, "scalar actuator", actuator))?;
                Request::ScalarCmd {
                    id,
                    device_index,
                    scalars: vec![ScalarSubcommand {
                        index: actuator,
                        scalar: intensity,
                        actuator_type: attributes.actuator_type.clone(),
                    }],
                }
            }
            ActuatorCommand::Linear {
                duration_ms,
                position,
            } => {
                if messages.linear_cmd.get(actuator as usize).is_none() {
                    return Err(missing_feature(&entry, "linear actuator", actuator));
                }
                Request::LinearCmd {
                    id,
                    device_index,
                    vectors: vec![VectorSubcommand {
                        index: actuator,
                        duration: duration_ms,
                        position,
                    }],
                }
            }
            ActuatorCommand::Rotate { speed, clockwise } => {
                if messages.rotate_cmd.get(actuator as usize).is_none() {
                    return Err(missing_feature(&entry, "rotatory actuator", actuator));
                }
                Request::RotateCmd {
                    id,
                    device_index,
                    rotations: vec![RotationSubcommand {
                        index: actuator,
                        speed,
                        clockwise,
                    }],
                }
            }
        };

        self.expect_ok(request).await?;
        Ok(())
    }

    async fn read_sensor(&self, device: u32, sensor: u32) -> ClientResult<Vec<Number>> {
        self.ensure_connected()?;
        let entry = self.entry_at(device)?;
        let sensor_type = entry
            .device_messages
            .sensor_read_cmd
            .get(sensor as usize)
            .ok_or_else(|| missing_feature(&entry, "sensor", sensor))?
            .sensor_type
            .clone();
        let device_index = entry.device_index;

        let reply = self
            .request(Request::SensorReadCmd {
                id: self.next_id(),
                device_index,
                sensor_index: sensor,
                sensor_type,
            })
            .await?;

        match reply {
            ServerMessage::SensorReading { data, .. } => {
                Ok(data.into_iter().map(Number::from).collect())
            }
            other => Err(unexpected("SensorReadCmd", &other).into()),
        }
    }
}

impl Drop for IntifaceClient {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}
