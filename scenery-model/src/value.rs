use serde::{Deserialize, Serialize};

/// The data type of a property field or dataset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Number,
    String,
    Url,
    LatLng,
    LatLngHeight,
    /// Identity of another dataset record. Only meaningful on dataset fields,
    /// where it forms the edges of the dataset graph.
    Ref,
}

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A geographic point with an altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngHeight {
    pub lat: f64,
    pub lng: f64,
    pub height: f64,
}

/// A typed literal held by a property field or a dataset field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Url(String),
    LatLng(LatLng),
    LatLngHeight(LatLngHeight),
    Ref(String),
}

impl Value {
    /// Returns the type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Url(_) => ValueType::Url,
            Value::LatLng(_) => ValueType::LatLng,
            Value::LatLngHeight(_) => ValueType::LatLngHeight,
            Value::Ref(_) => ValueType::Ref,
        }
    }

    /// Converts the value to `to`, if the two types are compatible.
    ///
    /// Dataset values are often imported from CSV or GeoJSON and arrive as
    /// strings, so strings convert to any scalar type they parse as.
    /// Returns `None` when no lossless-enough conversion exists.
    pub fn cast(&self, to: ValueType) -> Option<Value> {
        if self.value_type() == to {
            return Some(self.clone());
        }
        match (self, to) {
            (Value::Number(n), ValueType::String) => Some(Value::String(n.to_string())),
            (Value::Bool(b), ValueType::String) => Some(Value::String(b.to_string())),
            (Value::Url(s) | Value::Ref(s), ValueType::String) => Some(Value::String(s.clone())),
            (Value::String(s), ValueType::Number) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Value::Number),
            (Value::String(s), ValueType::Bool) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (Value::String(s), ValueType::Url) if s.contains("://") => Some(Value::Url(s.clone())),
            (Value::String(s), ValueType::Ref) => Some(Value::Ref(s.clone())),
            (Value::LatLngHeight(p), ValueType::LatLng) => Some(Value::LatLng(LatLng {
                lat: p.lat,
                lng: p.lng,
            })),
            (Value::LatLng(p), ValueType::LatLngHeight) => Some(Value::LatLngHeight(LatLngHeight {
                lat: p.lat,
                lng: p.lng,
                height: 0.0,
            })),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Url(s) | Value::Ref(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
