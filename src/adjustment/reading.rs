use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Anything that does not yield a finite decimal is an absent reading rather
/// than a decode error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading(Option<f64>);

impl Reading {
    pub const ABSENT: Reading = Reading(None);

    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(Some(value))
        } else {
            Self::ABSENT
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(Self::new).unwrap_or(Self::ABSENT),
            Value::String(s) => s.parse().map(Self::new).unwrap_or(Self::ABSENT),
            _ => Self::ABSENT,
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}
