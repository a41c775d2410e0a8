//! Actuator command models

use serde::{Deserialize, Serialize};

use super::ActuatorKind;

/// A validated command for one actuator.
///
/// One variant per actuator category; every consumer matches on it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorCommand {
    /// Set a scalar actuator's intensity (0.0 - 1.0)
    Scalar {
        /// Intensity in [0.0, 1.0]
        intensity: f64,
    },
    /// Move a linear actuator to a position over a duration
    Linear {
        /// Movement duration in milliseconds
        duration_ms: u32,
        /// Target position in [0.0, 1.0]
        position: f64,
    },
    /// Spin a rotatory actuator
    Rotate {
        /// Speed in [0.0, 1.0]
        speed: f64,
        /// Rotation direction
        clockwise: bool,
    },
}

impl ActuatorCommand {
    /// The actuator category this command addresses
    pub fn kind(&self) -> ActuatorKind {
        match self {
            ActuatorCommand::Scalar { .. } => ActuatorKind::Scalar,
            ActuatorCommand::Linear { .. } => ActuatorKind::Linear,
            ActuatorCommand::Rotate { .. } => ActuatorKind::Rotatory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_kind_matches_variant() {
        assert_eq!(
            ActuatorCommand::Scalar { intensity: 0.5 }.kind(),
            ActuatorKind::Scalar
        );
        assert_eq!(
            ActuatorCommand::Linear {
                duration_ms: 500,
                position: 0.0
            }
            .kind(),
            ActuatorKind::Linear
        );
        assert_eq!(
            ActuatorCommand::Rotate {
                speed: 1.0,
                clockwise: true
            }
            .kind(),
            ActuatorKind::Rotatory
        );
    }
}
