//! Values and value objects
//!
//! A parameter's state is a set of [`ValueObject`]s. Each one assigns a
//! [`Value`] to a year and a combination of secondary labels (for example
//! `MARS = "single"`). Values produced by extension rather than set
//! explicitly carry the `_auto` marker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Secondary label assignment (every label except `year`).
pub type Labels = BTreeMap<String, String>;

/// Declared type of a parameter's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[serde(alias = "real")]
    Float,
    #[serde(alias = "integer")]
    Int,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "string")]
    Str,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Str => "str",
        };
        f.write_str(name)
    }
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    ///
    /// ```
    /// use taxparams_rs::Value;
    ///
    /// assert_eq!(Value::Int(3).as_f64(), Some(3.0));
    /// assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
    /// assert_eq!(Value::Str("single".into()).as_f64(), None);
    /// ```
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert the value to the declared type where that is lossless.
    ///
    /// Integers widen to floats, and floats with no fractional part narrow to
    /// integers. Anything else is returned as `None`.
    pub fn coerce(&self, value_type: ValueType) -> Option<Value> {
        match (value_type, self) {
            (ValueType::Float, Value::Float(_)) => Some(self.clone()),
            (ValueType::Float, Value::Int(v)) => Some(Value::Float(*v as f64)),
            (ValueType::Int, Value::Int(_)) => Some(self.clone()),
            (ValueType::Int, Value::Float(v)) if v.fract() == 0.0 && v.is_finite() => {
                Some(Value::Int(*v as i64))
            }
            (ValueType::Bool, Value::Bool(_)) => Some(self.clone()),
            (ValueType::Str, Value::Str(_)) => Some(self.clone()),
            _ => None,
        }
    }

    /// Value as an array cell: numbers as-is, booleans as 0/1.
    pub(crate) fn as_cell(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_f64(),
        }
    }

    pub(crate) fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A value assigned to one year and one secondary label combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueObject {
    pub year: i32,

    #[serde(flatten)]
    pub labels: Labels,

    pub value: Value,

    /// True when the value was produced by extension.
    #[serde(rename = "_auto", default, skip_serializing_if = "is_false")]
    pub auto: bool,
}

impl ValueObject {
    /// Create an explicit value object with no secondary labels.
    ///
    /// ```
    /// use taxparams_rs::{Value, ValueObject};
    ///
    /// let vo = ValueObject::new(2020, Value::Float(1000.0)).with_label("MARS", "single");
    /// assert_eq!(vo.year, 2020);
    /// assert_eq!(vo.labels["MARS"], "single");
    /// assert!(!vo.auto);
    /// ```
    pub fn new(year: i32, value: Value) -> Self {
        Self {
            year,
            labels: Labels::new(),
            value,
            auto: false,
        }
    }

    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub(crate) fn extrapolated(year: i32, labels: Labels, value: Value) -> Self {
        Self {
            year,
            labels,
            value,
            auto: true,
        }
    }
}
