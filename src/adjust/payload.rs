//! Parsing of adjustment payloads
//!
//! A payload is a JSON object. A plain key names a parameter and maps to a
//! scalar or to a list of value objects; a key carrying the indexed suffix
//! maps to a boolean or to a list of `{"year": .., "value": <bool>}` objects.
//! Parsing only checks shapes. Names and values are checked when the
//! adjustment is planned.

use crate::config::StoreConfig;
use crate::error::{Result, TaxParamsError};
use crate::value::{Labels, Value, ValueObject};
use std::collections::BTreeMap;

/// Values requested for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawValues {
    /// One value for the horizon start year, for every label combination.
    Scalar(Value),
    Entries(Vec<ValueObject>),
}

/// A payload split into value changes and indexed-status changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Payload {
    pub(crate) values: BTreeMap<String, RawValues>,
    pub(crate) indexed: BTreeMap<String, BTreeMap<i32, bool>>,
}

fn malformed(key: &str, what: impl std::fmt::Display) -> TaxParamsError {
    TaxParamsError::MalformedInput(format!("'{}': {}", key, what))
}

fn parse_year(key: &str, raw: &serde_json::Value) -> Result<i32> {
    raw.as_i64()
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| malformed(key, format!("year {} is not an integer", raw)))
}

fn parse_status(key: &str, raw: &serde_json::Value, default_year: i32) -> Result<BTreeMap<i32, bool>> {
    match raw {
        serde_json::Value::Bool(b) => Ok(BTreeMap::from([(default_year, *b)])),
        serde_json::Value::Array(items) => {
            let mut changes = BTreeMap::new();
            for item in items {
                let obj = item
                    .as_object()
                    .ok_or_else(|| malformed(key, format!("expected an object, got {}", item)))?;
                let mut year = default_year;
                let mut value = None;
                for (field, raw) in obj {
                    match field.as_str() {
                        "year" => year = parse_year(key, raw)?,
                        "value" => {
                            value = Some(raw.as_bool().ok_or_else(|| {
                                malformed(key, format!("indexed status must be a boolean, got {}", raw))
                            })?)
                        }
                        other => {
                            return Err(malformed(key, format!("unexpected field '{}'", other)))
                        }
                    }
                }
                let value = value.ok_or_else(|| malformed(key, "entry has no value"))?;
                changes.insert(year, value);
            }
            Ok(changes)
        }
        other => Err(malformed(
            key,
            format!("expected a boolean or a list of year/value objects, got {}", other),
        )),
    }
}

fn parse_entry(key: &str, item: &serde_json::Value, default_year: i32) -> Result<ValueObject> {
    let obj = item
        .as_object()
        .ok_or_else(|| malformed(key, format!("expected a value object, got {}", item)))?;
    let mut year = default_year;
    let mut value = None;
    let mut labels = Labels::new();
    for (field, raw) in obj {
        match field.as_str() {
            "year" => year = parse_year(key, raw)?,
            "value" => {
                value = Some(
                    Value::from_json(raw)
                        .ok_or_else(|| malformed(key, format!("value {} is not a scalar", raw)))?,
                )
            }
            label => {
                let choice = raw.as_str().ok_or_else(|| {
                    malformed(key, format!("label '{}' must be a string, got {}", label, raw))
                })?;
                labels.insert(label.to_string(), choice.to_string());
            }
        }
    }
    let value = value.ok_or_else(|| malformed(key, "value object has no value"))?;
    Ok(ValueObject::new(year, value).with_labels(labels))
}

impl Payload {
    /// Split `payload` into value and status changes.
    ///
    /// `default_year` is used for scalars and for entries without a year.
    pub(crate) fn parse(
        payload: &serde_json::Value,
        config: &StoreConfig,
        default_year: i32,
    ) -> Result<Self> {
        let object = payload.as_object().ok_or_else(|| {
            TaxParamsError::MalformedInput(format!(
                "adjustment must be a JSON object, got {}",
                payload
            ))
        })?;

        let mut parsed = Payload::default();
        for (key, raw) in object {
            if let Some(base) = config.indexed_base(key) {
                parsed
                    .indexed
                    .insert(base.to_string(), parse_status(key, raw, default_year)?);
                continue;
            }
            let values = match raw {
                serde_json::Value::Array(items) => RawValues::Entries(
                    items
                        .iter()
                        .map(|item| parse_entry(key, item, default_year))
                        .collect::<Result<_>>()?,
                ),
                other => RawValues::Scalar(Value::from_json(other).ok_or_else(|| {
                    malformed(key, format!("expected a scalar or a list, got {}", other))
                })?),
            };
            parsed.values.insert(key.clone(), values);
        }
        Ok(parsed)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty() && self.indexed.is_empty()
    }
}
