//! Command validation and dispatch
//!
//! [`ValidatedCommand`] is the extractor every actuator POST route takes.
//! It resolves the addressed actuator through the registry first, so a
//! disconnected client (502) or a missing resource (404) is reported ahead
//! of payload problems (422), and only then validates the body against the
//! schema of the actuator kind. Handler bodies only ever see a validated
//! command.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use buttrest_core::{ActuatorCommand, ActuatorInfo, ActuatorKind, DeviceClient};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldError, Resource};
use crate::registry::parse_index;
use crate::state::AppState;

/// Per-kind payload schema
pub trait CommandSchema: Sized + Send {
    /// Actuator collection this schema applies to
    const KIND: ActuatorKind;

    /// Validate a JSON object, reporting every offending field
    fn parse(body: &Map<String, Value>) -> Result<Self, Vec<FieldError>>;

    fn into_command(self) -> ActuatorCommand;
}

/// `{"intensity": 0.0..=1.0}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarCommand {
    pub intensity: f64,
}

/// `{"duration": ms >= 0, "position": 0.0..=1.0}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCommand {
    pub duration_ms: u32,
    pub position: f64,
}

/// `{"speed": 0.0..=1.0, "clockwise": bool?}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateCommand {
    pub speed: f64,
    pub clockwise: bool,
}

impl CommandSchema for ScalarCommand {
    const KIND: ActuatorKind = ActuatorKind::Scalar;

    fn parse(body: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut fields = Fields::new(body);
        let intensity = fields.unit_interval("intensity");
        fields.finish(intensity.map(|intensity| ScalarCommand { intensity }))
    }

    fn into_command(self) -> ActuatorCommand {
        ActuatorCommand::Scalar {
            intensity: self.intensity,
        }
    }
}

impl CommandSchema for LinearCommand {
    const KIND: ActuatorKind = ActuatorKind::Linear;

    fn parse(body: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut fields = Fields::new(body);
        let duration = fields.milliseconds("duration");
        let position = fields.unit_interval("position");
        fields.finish(duration.zip(position).map(|(duration_ms, position)| {
            LinearCommand {
                duration_ms,
                position,
            }
        }))
    }

    fn into_command(self) -> ActuatorCommand {
        ActuatorCommand::Linear {
            duration_ms: self.duration_ms,
            position: self.position,
        }
    }
}

impl CommandSchema for RotateCommand {
    const KIND: ActuatorKind = ActuatorKind::Rotatory;

    fn parse(body: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut fields = Fields::new(body);
        let speed = fields.unit_interval("speed");
        let clockwise = fields.optional_bool("clockwise");
        fields.finish(
            speed
                .zip(clockwise)
                .map(|(speed, clockwise)| RotateCommand { speed, clockwise }),
        )
    }

    fn into_command(self) -> ActuatorCommand {
        ActuatorCommand::Rotate {
            speed: self.speed,
            clockwise: self.clockwise,
        }
    }
}

/// Field checks that accumulate errors instead of stopping at the first
struct Fields<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    fn new(body: &'a Map<String, Value>) -> Self {
        Self {
            body,
            errors: Vec::new(),
        }
    }

    fn fail<T>(&mut self, error: FieldError) -> Option<T> {
        self.errors.push(error);
        None
    }

    fn unit_interval(&mut self, field: &str) -> Option<f64> {
        match self.body.get(field) {
            None => self.fail(FieldError::required(field)),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if (0.0..=1.0).contains(&v) => Some(v),
                _ => self.fail(FieldError::out_of_range(
                    field,
                    format!("'{}' must be between 0.0 and 1.0", field),
                )),
            },
            Some(_) => self.fail(FieldError::invalid_type(field, "a number")),
        }
    }

    fn milliseconds(&mut self, field: &str) -> Option<u32> {
        match self.body.get(field) {
            None => self.fail(FieldError::required(field)),
            Some(Value::Number(n)) if n.is_u64() => {
                match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
                    Some(v) => Some(v),
                    None => self.fail(FieldError::out_of_range(
                        field,
                        format!("'{}' must be at most {} ms", field, u32::MAX),
                    )),
                }
            }
            Some(Value::Number(n)) if n.is_i64() => self.fail(FieldError::out_of_range(
                field,
                format!("'{}' must be a non-negative number of milliseconds", field),
            )),
            Some(_) => self.fail(FieldError::invalid_type(field, "an integer")),
        }
    }

    /// Missing or null means `false`
    fn optional_bool(&mut self, field: &str) -> Option<bool> {
        match self.body.get(field) {
            None | Some(Value::Null) => Some(false),
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => self.fail(FieldError::invalid_type(field, "a boolean")),
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldError>> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// Parse a raw request body against a schema
pub fn parse_body<C: CommandSchema>(bytes: &[u8]) -> Result<C, ApiError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        ApiError::InvalidCommand(vec![FieldError::invalid_body(format!(
            "Body is not valid JSON: {}",
            e
        ))])
    })?;

    let Value::Object(body) = value else {
        return Err(ApiError::InvalidCommand(vec![FieldError::invalid_body(
            "Body must be a JSON object",
        )]));
    };

    C::parse(&body).map_err(ApiError::InvalidCommand)
}

/// A command that passed lookup and validation
#[derive(Debug)]
pub struct ValidatedCommand<C> {
    pub device_id: u32,
    pub actuator: ActuatorInfo,
    pub command: C,
}

impl<C: CommandSchema> FromRequest<AppState> for ValidatedCommand<C> {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let Path((raw_device, raw_actuator)) =
            Path::<(String, String)>::from_request_parts(&mut parts, state)
                .await
                .map_err(|e| ApiError::Internal(e.body_text()))?;
        let device_id = parse_index(Resource::Device, &raw_device)?;
        let actuator_id = parse_index(Resource::Actuator(C::KIND), &raw_actuator)?;
        let actuator = state
            .registry()
            .actuator_of(device_id, C::KIND, actuator_id)?;

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| ApiError::InvalidCommand(vec![FieldError::invalid_body(e.body_text())]))?;
        let command = parse_body::<C>(&bytes)?;

        Ok(Self {
            device_id,
            actuator,
            command,
        })
    }
}

/// Acknowledgement returned for an accepted command
#[derive(Debug, Serialize)]
pub struct CommandAck {
    pub status: &'static str,
}

impl CommandAck {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Forward a validated command to the client. No retries.
pub async fn dispatch(
    client: &dyn DeviceClient,
    device_id: u32,
    actuator_id: u32,
    command: ActuatorCommand,
) -> Result<(), ApiError> {
    match command {
        ActuatorCommand::Scalar { intensity } => {
            tracing::info!(device_id, actuator_id, intensity, "Scalar command");
        }
        ActuatorCommand::Linear {
            duration_ms,
            position,
        } => {
            tracing::info!(device_id, actuator_id, duration_ms, position, "Linear command");
        }
        ActuatorCommand::Rotate { speed, clockwise } => {
            tracing::info!(device_id, actuator_id, speed, clockwise, "Rotate command");
        }
    }

    client
        .send_command(device_id, actuator_id, &command)
        .await
        .map_err(|e| {
            tracing::warn!(device_id, actuator_id, error = %e, "Command failed");
            ApiError::from(e)
        })
}

#[cfg(test)]
mod tests {
    use buttrest_core::MockClient;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn field_errors<C: CommandSchema + std::fmt::Debug>(value: Value) -> Vec<FieldError> {
        C::parse(&object(value)).unwrap_err()
    }

    #[test]
    fn scalar_accepts_unit_interval_bounds() {
        assert_eq!(
            ScalarCommand::parse(&object(json!({"intensity": 0}))).unwrap(),
            ScalarCommand { intensity: 0.0 }
        );
        assert_eq!(
            ScalarCommand::parse(&object(json!({"intensity": 1.0, "extra": "ignored"}))).unwrap(),
            ScalarCommand { intensity: 1.0 }
        );
    }

    #[test]
    fn scalar_rejects_out_of_range_intensity() {
        let errors = field_errors::<ScalarCommand>(json!({"intensity": 1.5}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].pointer, "/intensity");
        assert_eq!(errors[0].code, "out_of_range");
    }

    #[test]
    fn scalar_rejects_wrong_type() {
        let errors = field_errors::<ScalarCommand>(json!({"intensity": "high"}));
        assert_eq!(errors[0].code, "invalid_type");
    }

    #[test]
    fn linear_reports_every_field() {
        let errors = field_errors::<LinearCommand>(json!({"position": 2.0}));
        let pointers: Vec<&str> = errors.iter().map(|e| e.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["/duration", "/position"]);
        assert_eq!(errors[0].code, "required");
        assert_eq!(errors[1].code, "out_of_range");
    }

    #[test]
    fn linear_rejects_negative_duration() {
        let errors = field_errors::<LinearCommand>(json!({"duration": -1, "position": 0.5}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].pointer, "/duration");
        assert_eq!(errors[0].code, "out_of_range");
    }

    #[test]
    fn linear_rejects_fractional_duration() {
        let errors = field_errors::<LinearCommand>(json!({"duration": 1.5, "position": 0.5}));
        assert_eq!(errors[0].code, "invalid_type");
    }

    #[test]
    fn linear_accepts_zero_position() {
        assert_eq!(
            LinearCommand::parse(&object(json!({"duration": 0, "position": 0.0}))).unwrap(),
            LinearCommand {
                duration_ms: 0,
                position: 0.0
            }
        );
    }

    #[test]
    fn rotate_defaults_clockwise_to_false() {
        assert_eq!(
            RotateCommand::parse(&object(json!({"speed": 0.25}))).unwrap(),
            RotateCommand {
                speed: 0.25,
                clockwise: false
            }
        );
        assert!(
            RotateCommand::parse(&object(json!({"speed": 0.25, "clockwise": true})))
                .unwrap()
                .clockwise
        );
    }

    #[test]
    fn rotate_rejects_non_boolean_direction() {
        let errors = field_errors::<RotateCommand>(json!({"speed": 0.25, "clockwise": "yes"}));
        assert_eq!(errors[0].pointer, "/clockwise");
        assert_eq!(errors[0].code, "invalid_type");
    }

    #[test]
    fn non_object_body_is_invalid_body() {
        for body in [&b"[1, 2]"[..], b"not json", b""] {
            match parse_body::<ScalarCommand>(body) {
                Err(ApiError::InvalidCommand(errors)) => {
                    assert_eq!(errors.len(), 1);
                    assert_eq!(errors[0].pointer, "");
                    assert_eq!(errors[0].code, "invalid_body");
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn dispatch_forwards_to_client() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        client.start_scanning().await.unwrap();

        let command = RotateCommand {
            speed: 0.5,
            clockwise: true,
        }
        .into_command();
        dispatch(&client, 2, 0, command).await.unwrap();

        let sent = client.sent_commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].device, 2);
        assert_eq!(sent[0].command, command);
    }

    #[tokio::test]
    async fn dispatch_maps_hardware_failure() {
        let client = MockClient::demo("test");
        client.connect().await.unwrap();
        client.start_scanning().await.unwrap();
        client.fail_commands(Some("motor stalled".to_string()));

        let err = dispatch(&client, 0, 0, ActuatorCommand::Scalar { intensity: 0.5 })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Hardware(ref m) if m == "motor stalled"));
    }
}
