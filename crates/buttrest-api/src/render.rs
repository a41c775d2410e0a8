//! Resource model and renderer
//!
//! Pure transformations from registry handles into JSON-LD documents.
//! Every identity URL comes from [`buttrest_core::links`], so a rendered
//! link always dereferences to a resource with the same `@id`.

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use buttrest_core::{links, ActuatorInfo, ActuatorKind, DeviceInfo, Number, SensorInfo};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::read::Reading;

pub const LD_JSON: &str = "application/ld+json";

/// The JSON-LD context every document is compacted against
pub fn context() -> Value {
    json!({
        "buttplug": "http://buttplug.io/schema/",
        "schema": "http://schema.org/",
        "name": "schema:name",
        "display_name": "schema:alternateName",
        "description": "schema:description",
        "member": {"@id": "schema:itemListElement", "@type": "@id", "@container": "@list"},
        "step_count": "buttplug:step_count",
        "actuator_type": "buttplug:actuator_type",
        "sensor_type": "buttplug:sensor_type",
        "ranges": {"@id": "buttplug:ranges", "@container": "@list"},
        "value": {"@id": "buttplug:sensor_reading_value", "@container": "@list"},
        "captured_at": {"@id": "schema:dateCreated", "@type": "schema:DateTime"},
        "device": {"@id": "buttplug:device", "@type": "@id"},
        "sensor": {"@id": "buttplug:sensor", "@type": "@id"},
        "sensors": {"@id": "buttplug:sensors", "@type": "@id", "@container": "@list"},
        "sensor_reading": {"@id": "buttplug:sensor_reading", "@type": "@id"},
        "actuators": {"@id": "buttplug:actuators", "@type": "@id", "@container": "@list"},
        "linear_actuators": {"@id": "buttplug:linear_actuators", "@type": "@id", "@container": "@list"},
        "rotatory_actuators": {"@id": "buttplug:rotatory_actuators", "@type": "@id", "@container": "@list"},
        "Device": "buttplug:Device",
        "Sensor": "buttplug:Sensor",
        "SensorReading": "buttplug:SensorReading",
        "Actuator": "buttplug:Actuator",
        "LinearActuator": "buttplug:LinearActuator",
        "RotatoryActuator": "buttplug:RotatoryActuator",
        "ItemList": "schema:ItemList"
    })
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceItem {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub sensors: Vec<String>,
    pub actuators: Vec<String>,
    pub linear_actuators: Vec<String>,
    pub rotatory_actuators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorItem {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub description: String,
    pub sensor_type: String,
    pub ranges: Vec<[i32; 2]>,
    pub sensor_reading: String,
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActuatorItem {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub description: String,
    pub actuator_type: String,
    pub step_count: u32,
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReadingItem {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub sensor: String,
    pub value: Vec<Number>,
    /// RFC 3339, UTC
    pub captured_at: String,
}

// =============================================================================
// Envelopes
// =============================================================================

/// A top-level JSON-LD document: the item plus its `@context`
#[derive(Debug, Clone, Serialize)]
pub struct Document<T> {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(flatten)]
    pub item: T,
}

impl<T> Document<T> {
    pub fn new(item: T) -> Self {
        Self {
            context: context(),
            item,
        }
    }
}

/// A list resource
#[derive(Debug, Clone, Serialize)]
pub struct Collection<T> {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub member: Vec<T>,
}

impl<T> Collection<T> {
    pub fn new(id: String, member: Vec<T>) -> Self {
        Self {
            context: context(),
            id,
            kind: "ItemList",
            member,
        }
    }
}

/// JSON body served as `application/ld+json`
pub struct LdJson<T>(pub T);

impl<T: Serialize> IntoResponse for LdJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(LD_JSON))],
                body,
            )
                .into_response(),
            Err(err) => ApiError::Internal(format!("Failed to encode document: {}", err))
                .into_response(),
        }
    }
}

// =============================================================================
// Renderers
// =============================================================================

pub fn render_device(device: &DeviceInfo) -> DeviceItem {
    let id = device.index;
    let actuator_links = |kind: ActuatorKind| -> Vec<String> {
        device
            .actuators_of(kind)
            .iter()
            .map(|a| links::actuator(id, kind, a.index))
            .collect()
    };

    DeviceItem {
        id: links::device(id),
        kind: "Device",
        name: device.name.clone(),
        display_name: device.display_name.clone(),
        sensors: device
            .sensors
            .iter()
            .map(|s| links::sensor(id, s.index))
            .collect(),
        actuators: actuator_links(ActuatorKind::Scalar),
        linear_actuators: actuator_links(ActuatorKind::Linear),
        rotatory_actuators: actuator_links(ActuatorKind::Rotatory),
    }
}

pub fn render_sensor(device_id: u32, sensor: &SensorInfo) -> SensorItem {
    SensorItem {
        id: links::sensor(device_id, sensor.index),
        kind: "Sensor",
        description: sensor.description.clone(),
        sensor_type: sensor.sensor_type.clone(),
        ranges: sensor.ranges.clone(),
        sensor_reading: links::sensor_reading(device_id, sensor.index),
        device: links::device(device_id),
    }
}

pub fn render_actuator(device_id: u32, kind: ActuatorKind, actuator: &ActuatorInfo) -> ActuatorItem {
    ActuatorItem {
        id: links::actuator(device_id, kind, actuator.index),
        kind: kind.type_name(),
        description: actuator.description.clone(),
        actuator_type: actuator.actuator_type.clone(),
        step_count: actuator.step_count,
        device: links::device(device_id),
    }
}

pub fn render_sensor_reading(device_id: u32, sensor_id: u32, reading: &Reading) -> SensorReadingItem {
    SensorReadingItem {
        id: links::sensor_reading(device_id, sensor_id),
        kind: "SensorReading",
        sensor: links::sensor(device_id, sensor_id),
        value: reading.values.clone(),
        captured_at: format_instant(reading.captured_at),
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn vibrator() -> DeviceInfo {
        DeviceInfo::new(4, "Vibrator")
            .with_actuator(ActuatorKind::Scalar, "Motor", "Vibrate", 20)
            .with_actuator(ActuatorKind::Rotatory, "Spinner", "Rotate", 10)
            .with_sensor("Battery Level", "Battery", vec![[0, 100]])
    }

    #[test]
    fn device_links_every_child() {
        let item = render_device(&vibrator());

        assert_eq!(item.id, "/devices/4");
        assert_eq!(item.sensors, vec!["/devices/4/sensors/0"]);
        assert_eq!(item.actuators, vec!["/devices/4/actuators/0"]);
        assert!(item.linear_actuators.is_empty());
        assert_eq!(item.rotatory_actuators, vec!["/devices/4/rotatory_actuators/0"]);
    }

    #[test]
    fn actuator_discriminator_follows_kind() {
        let device = vibrator();
        let item = render_actuator(4, ActuatorKind::Rotatory, &device.rotatory_actuators[0]);

        assert_eq!(item.kind, "RotatoryActuator");
        assert_eq!(item.id, "/devices/4/rotatory_actuators/0");
        assert_eq!(item.step_count, 10);
        assert_eq!(item.device, "/devices/4");
    }

    #[test]
    fn sensor_links_to_its_reading() {
        let device = vibrator();
        let item = render_sensor(4, &device.sensors[0]);

        assert_eq!(item.sensor_reading, "/devices/4/sensors/0/read");
        assert_eq!(item.sensor_type, "Battery");
    }

    #[test]
    fn reading_carries_capture_instant() {
        let reading = Reading {
            values: vec![Number::Int(87)],
            captured_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let item = render_sensor_reading(4, 0, &reading);

        assert_eq!(item.captured_at, "2024-05-01T12:00:00.000Z");
        assert_eq!(item.sensor, "/devices/4/sensors/0");
        assert_eq!(serde_json::to_value(&item.value).unwrap(), json!([87]));
    }

    #[test]
    fn renders_are_byte_identical() {
        let device = vibrator();
        let first = serde_json::to_vec(&Document::new(render_device(&device))).unwrap();
        let second = serde_json::to_vec(&Document::new(render_device(&device))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn document_flattens_item_next_to_context() {
        let json = serde_json::to_value(Document::new(render_device(&vibrator()))).unwrap();
        assert_eq!(json["@id"], "/devices/4");
        assert_eq!(json["@type"], "Device");
        assert!(json["@context"].is_object());
        assert!(json.get("display_name").is_none());
    }
}
