//! Buttplug protocol v3 messages
//!
//! Every websocket frame is a JSON array of externally tagged messages with
//! PascalCase fields:
//!
//! ```text
//! [{"RequestServerInfo": {"Id": 1, "ClientName": "buttrest", "MessageVersion": 3}}]
//! ```
//!
//! `Id` correlates a reply with its request; the server uses `Id: 0` for
//! unsolicited events such as `DeviceAdded`.

use buttrest_core::{ActuatorKind, DeviceInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version this client speaks
pub const MESSAGE_VERSION: u32 = 3;

/// Id the server uses for events that answer no request
pub const EVENT_ID: u32 = 0;

// =============================================================================
// Client -> Server
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all_fields = "PascalCase")]
pub enum Request {
    RequestServerInfo {
        id: u32,
        client_name: String,
        message_version: u32,
    },
    Ping {
        id: u32,
    },
    RequestDeviceList {
        id: u32,
    },
    StartScanning {
        id: u32,
    },
    StopScanning {
        id: u32,
    },
    ScalarCmd {
        id: u32,
        device_index: u32,
        scalars: Vec<ScalarSubcommand>,
    },
    LinearCmd {
        id: u32,
        device_index: u32,
        vectors: Vec<VectorSubcommand>,
    },
    RotateCmd {
        id: u32,
        device_index: u32,
        rotations: Vec<RotationSubcommand>,
    },
    SensorReadCmd {
        id: u32,
        device_index: u32,
        sensor_index: u32,
        sensor_type: String,
    },
}

impl Request {
    pub fn id(&self) -> u32 {
        match self {
            Request::RequestServerInfo { id, .. }
            | Request::Ping { id }
            | Request::RequestDeviceList { id }
            | Request::StartScanning { id }
            | Request::StopScanning { id }
            | Request::ScalarCmd { id, .. }
            | Request::LinearCmd { id, .. }
            | Request::RotateCmd { id, .. }
            | Request::SensorReadCmd { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Request::RequestServerInfo { .. } => "RequestServerInfo",
            Request::Ping { .. } => "Ping",
            Request::RequestDeviceList { .. } => "RequestDeviceList",
            Request::StartScanning { .. } => "StartScanning",
            Request::StopScanning { .. } => "StopScanning",
            Request::ScalarCmd { .. } => "ScalarCmd",
            Request::LinearCmd { .. } => "LinearCmd",
            Request::RotateCmd { .. } => "RotateCmd",
            Request::SensorReadCmd { .. } => "SensorReadCmd",
        }
    }

    /// Encode as a single-message frame
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(&[self])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScalarSubcommand {
    pub index: u32,
    pub scalar: f64,
    pub actuator_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VectorSubcommand {
    pub index: u32,
    /// Milliseconds
    pub duration: u32,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotationSubcommand {
    pub index: u32,
    pub speed: f64,
    pub clockwise: bool,
}

// =============================================================================
// Server -> Client
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all_fields = "PascalCase")]
pub enum ServerMessage {
    Ok {
        id: u32,
    },
    Error {
        id: u32,
        error_message: String,
        #[serde(default)]
        error_code: u32,
    },
    ServerInfo {
        id: u32,
        #[serde(default)]
        server_name: Option<String>,
        message_version: u32,
        /// Milliseconds; 0 disables the ping requirement
        #[serde(default)]
        max_ping_time: u64,
    },
    DeviceList {
        id: u32,
        devices: Vec<DeviceEntry>,
    },
    DeviceAdded(DeviceEntry),
    DeviceRemoved {
        id: u32,
        device_index: u32,
    },
    ScanningFinished {
        id: u32,
    },
    SensorReading {
        id: u32,
        device_index: u32,
        sensor_index: u32,
        sensor_type: String,
        data: Vec<i32>,
    },
}

impl ServerMessage {
    pub fn id(&self) -> u32 {
        match self {
            ServerMessage::Ok { id }
            | ServerMessage::Error { id, .. }
            | ServerMessage::ServerInfo { id, .. }
            | ServerMessage::DeviceList { id, .. }
            | ServerMessage::DeviceRemoved { id, .. }
            | ServerMessage::ScanningFinished { id }
            | ServerMessage::SensorReading { id, .. } => *id,
            ServerMessage::DeviceAdded(entry) => entry.id,
        }
    }
}

/// Decode a frame. Elements that are not messages this client understands
/// are returned as errors alongside the ones that decoded.
pub fn decode_frame(text: &str) -> serde_json::Result<Vec<serde_json::Result<ServerMessage>>> {
    let elements: Vec<Value> = serde_json::from_str(text)?;
    Ok(elements
        .into_iter()
        .map(serde_json::from_value::<ServerMessage>)
        .collect())
}

/// A device as announced by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceEntry {
    /// Present on `DeviceAdded`, absent inside `DeviceList`
    #[serde(default)]
    pub id: u32,
    pub device_name: String,
    pub device_index: u32,
    #[serde(default)]
    pub device_display_name: Option<String>,
    #[serde(default)]
    pub device_messages: DeviceMessages,
}

/// The commands a device accepts, with per-feature attributes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceMessages {
    #[serde(default)]
    pub scalar_cmd: Vec<ActuatorAttributes>,
    #[serde(default)]
    pub linear_cmd: Vec<ActuatorAttributes>,
    #[serde(default)]
    pub rotate_cmd: Vec<ActuatorAttributes>,
    #[serde(default)]
    pub sensor_read_cmd: Vec<SensorAttributes>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActuatorAttributes {
    #[serde(default)]
    pub feature_descriptor: String,
    pub step_count: u32,
    #[serde(default)]
    pub actuator_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensorAttributes {
    #[serde(default)]
    pub feature_descriptor: String,
    pub sensor_type: String,
    #[serde(default)]
    pub sensor_range: Vec<[i32; 2]>,
}

impl DeviceMessages {
    pub fn actuators(&self, kind: ActuatorKind) -> &[ActuatorAttributes] {
        match kind {
            ActuatorKind::Scalar => &self.scalar_cmd,
            ActuatorKind::Linear => &self.linear_cmd,
            ActuatorKind::Rotatory => &self.rotate_cmd,
        }
    }
}

impl DeviceEntry {
    /// Convert to the client-neutral model at a registry position
    pub fn to_device_info(&self, position: u32) -> DeviceInfo {
        let mut device = DeviceInfo::new(position, self.device_name.clone());
        device.display_name = self
            .device_display_name
            .clone()
            .filter(|name| !name.is_empty());

        for kind in ActuatorKind::ALL {
            for attributes in self.device_messages.actuators(kind) {
                device = device.with_actuator(
                    kind,
                    attributes.feature_descriptor.clone(),
                    attributes.actuator_type.clone(),
                    attributes.step_count,
                );
            }
        }
        for attributes in &self.device_messages.sensor_read_cmd {
            device = device.with_sensor(
                attributes.feature_descriptor.clone(),
                attributes.sensor_type.clone(),
                attributes.sensor_range.clone(),
            );
        }
        device
    }
}
