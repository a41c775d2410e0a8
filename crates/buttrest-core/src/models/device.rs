//! Device, sensor and actuator descriptors

use serde::{Deserialize, Serialize};

/// A device as currently known by the client.
///
/// `index` is positional: it is the device's place in the client's ordered
/// device list and is only meaningful for the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Position in the client's device list
    pub index: u32,
    /// Name reported by the backend
    pub name: String,
    /// User-configured display name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Readable sensors, in feature order
    #[serde(default)]
    pub sensors: Vec<SensorInfo>,
    /// Scalar actuators (vibrate, oscillate, constrict, ...)
    #[serde(default)]
    pub actuators: Vec<ActuatorInfo>,
    /// Linear (position) actuators
    #[serde(default)]
    pub linear_actuators: Vec<ActuatorInfo>,
    /// Rotatory actuators
    #[serde(default)]
    pub rotatory_actuators: Vec<ActuatorInfo>,
}

impl DeviceInfo {
    /// Create a device with no features
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            display_name: None,
            sensors: Vec::new(),
            actuators: Vec::new(),
            linear_actuators: Vec::new(),
            rotatory_actuators: Vec::new(),
        }
    }

    /// Add a sensor, assigning it the next sensor index
    pub fn with_sensor(
        mut self,
        description: impl Into<String>,
        sensor_type: impl Into<String>,
        ranges: Vec<[i32; 2]>,
    ) -> Self {
        let index = self.sensors.len() as u32;
        self.sensors.push(SensorInfo {
            index,
            description: description.into(),
            sensor_type: sensor_type.into(),
            ranges,
        });
        self
    }

    /// Add an actuator of the given kind, assigning it the next index in
    /// that kind's collection
    pub fn with_actuator(
        mut self,
        kind: ActuatorKind,
        description: impl Into<String>,
        actuator_type: impl Into<String>,
        step_count: u32,
    ) -> Self {
        let collection = self.actuators_mut(kind);
        let index = collection.len() as u32;
        collection.push(ActuatorInfo {
            index,
            description: description.into(),
            actuator_type: actuator_type.into(),
            step_count,
        });
        self
    }

    /// The actuator collection for a kind
    pub fn actuators_of(&self, kind: ActuatorKind) -> &[ActuatorInfo] {
        match kind {
            ActuatorKind::Scalar => &self.actuators,
            ActuatorKind::Linear => &self.linear_actuators,
            ActuatorKind::Rotatory => &self.rotatory_actuators,
        }
    }

    fn actuators_mut(&mut self, kind: ActuatorKind) -> &mut Vec<ActuatorInfo> {
        match kind {
            ActuatorKind::Scalar => &mut self.actuators,
            ActuatorKind::Linear => &mut self.linear_actuators,
            ActuatorKind::Rotatory => &mut self.rotatory_actuators,
        }
    }
}

/// A readable sensor on a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    /// Position in the device's sensor list
    pub index: u32,
    /// Feature description
    pub description: String,
    /// Sensor type (Battery, RSSI, Button, Pressure, ...)
    pub sensor_type: String,
    /// Value range of each reading element
    #[serde(default)]
    pub ranges: Vec<[i32; 2]>,
}

/// An actuator on a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorInfo {
    /// Position in the device's collection for this actuator kind
    pub index: u32,
    /// Feature description
    pub description: String,
    /// Backend actuator type (Vibrate, Oscillate, Position, Rotate, ...)
    pub actuator_type: String,
    /// Number of discrete steps the hardware resolves
    pub step_count: u32,
}

/// The three actuator categories exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// Scalar actuator, commanded with an intensity
    Scalar,
    /// Linear actuator, commanded with a duration and a target position
    Linear,
    /// Rotatory actuator, commanded with a speed and a direction
    Rotatory,
}

impl ActuatorKind {
    /// All kinds, in rendering order
    pub const ALL: [ActuatorKind; 3] = [
        ActuatorKind::Scalar,
        ActuatorKind::Linear,
        ActuatorKind::Rotatory,
    ];

    /// URL path segment of this kind's collection
    pub fn path_segment(self) -> &'static str {
        match self {
            ActuatorKind::Scalar => "actuators",
            ActuatorKind::Linear => "linear_actuators",
            ActuatorKind::Rotatory => "rotatory_actuators",
        }
    }

    /// Type discriminator used in rendered resources
    pub fn type_name(self) -> &'static str {
        match self {
            ActuatorKind::Scalar => "Actuator",
            ActuatorKind::Linear => "LinearActuator",
            ActuatorKind::Rotatory => "RotatoryActuator",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            ActuatorKind::Scalar => "Actuator",
            ActuatorKind::Linear => "Linear Actuator",
            ActuatorKind::Rotatory => "Rotatory Actuator",
        }
    }
}

impl std::fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
