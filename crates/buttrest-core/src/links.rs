//! Resource links and route templates.
//!
//! Rendered identity URLs and the router's path templates both come from
//! this module so every call site builds the same addresses. The tests
//! expand each template and compare it with the matching link builder.

use crate::models::ActuatorKind;

pub const DEVICES: &str = "/devices";
pub const DEVICE: &str = "/devices/{device_id}";
pub const SENSORS: &str = "/devices/{device_id}/sensors";
pub const SENSOR: &str = "/devices/{device_id}/sensors/{sensor_id}";
pub const SENSOR_READING: &str = "/devices/{device_id}/sensors/{sensor_id}/read";

pub const ACTUATORS: &str = "/devices/{device_id}/actuators";
pub const ACTUATOR: &str = "/devices/{device_id}/actuators/{actuator_id}";
pub const LINEAR_ACTUATORS: &str = "/devices/{device_id}/linear_actuators";
pub const LINEAR_ACTUATOR: &str = "/devices/{device_id}/linear_actuators/{actuator_id}";
pub const ROTATORY_ACTUATORS: &str = "/devices/{device_id}/rotatory_actuators";
pub const ROTATORY_ACTUATOR: &str = "/devices/{device_id}/rotatory_actuators/{actuator_id}";

/// Route template of an actuator kind's collection
pub fn actuators_template(kind: ActuatorKind) -> &'static str {
    match kind {
        ActuatorKind::Scalar => ACTUATORS,
        ActuatorKind::Linear => LINEAR_ACTUATORS,
        ActuatorKind::Rotatory => ROTATORY_ACTUATORS,
    }
}

/// Route template of a single actuator of a kind
pub fn actuator_template(kind: ActuatorKind) -> &'static str {
    match kind {
        ActuatorKind::Scalar => ACTUATOR,
        ActuatorKind::Linear => LINEAR_ACTUATOR,
        ActuatorKind::Rotatory => ROTATORY_ACTUATOR,
    }
}

pub fn devices() -> String {
    DEVICES.to_string()
}

pub fn device(device_id: u32) -> String {
    format!("{}/{}", DEVICES, device_id)
}

pub fn sensors(device_id: u32) -> String {
    format!("{}/sensors", device(device_id))
}

pub fn sensor(device_id: u32, sensor_id: u32) -> String {
    format!("{}/{}", sensors(device_id), sensor_id)
}

pub fn sensor_reading(device_id: u32, sensor_id: u32) -> String {
    format!("{}/read", sensor(device_id, sensor_id))
}

pub fn actuators(device_id: u32, kind: ActuatorKind) -> String {
    format!("{}/{}", device(device_id), kind.path_segment())
}

pub fn actuator(device_id: u32, kind: ActuatorKind, actuator_id: u32) -> String {
    format!("{}/{}", actuators(device_id, kind), actuator_id)
}
