//! Sensor reading values

use serde::{Deserialize, Serialize};

/// A single element of a sensor reading.
///
/// Backends report integers for most sensor types; keeping them as
/// integers avoids rendering `42` as `42.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(value.into())
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_serialize_without_tags() {
        let values = vec![Number::from(87), Number::from(0.25)];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, "[87,0.25]");
    }

    #[test]
    fn integers_deserialize_as_int() {
        let values: Vec<Number> = serde_json::from_str("[3, 1.5]").unwrap();
        assert_eq!(values, vec![Number::Int(3), Number::Float(1.5)]);
    }
}
