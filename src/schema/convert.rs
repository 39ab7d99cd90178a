//! Conversion of Tax-Calculator policy files
//!
//! A `policy_current_law.json` document describes each parameter with a
//! `value_yrs` list and a `value` list that is either one scalar per year or,
//! for vectored parameters, one row per year whose columns are named by
//! `vi_name`/`vi_vals`. This module turns such a document into
//! [`Definitions`] under the policy label schema.

use crate::error::{Result, TaxParamsError};
use crate::schema::{Definitions, ParamDef, RangeRule, Schema, Validators};
use crate::value::{Labels, Value, ValueObject, ValueType};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Options for [`convert_policy`].
///
/// Missing fields of an options file take their default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// First horizon year. Default: 2013
    pub start_year: i32,

    /// Last horizon year. Default: 2029
    pub end_year: i32,

    /// Skip the `data_source` label entirely. Default: true
    pub ignore_data_source: bool,

    /// Latest statutory year, passed through to the definitions. Default: None
    pub last_known_year: Option<i32>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            start_year: 2013,
            end_year: 2029,
            ignore_data_source: true,
            last_known_year: None,
        }
    }
}

impl ConvertOptions {
    /// Read options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Deserialize)]
struct CompatibleData {
    #[serde(default)]
    puf: bool,
    #[serde(default)]
    cps: bool,
}

#[derive(Debug, Deserialize)]
struct PolicyEntry {
    long_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    section_1: Option<String>,
    #[serde(default)]
    section_2: Option<String>,
    value_type: ValueType,
    value_yrs: Vec<i32>,
    #[serde(default)]
    vi_name: Option<String>,
    #[serde(default)]
    vi_vals: Vec<String>,
    value: Vec<serde_json::Value>,
    #[serde(default)]
    valid_values: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    indexable: bool,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    compatible_data: Option<CompatibleData>,
}

fn data_source_label(entry: &PolicyEntry, ignore: bool) -> Option<&'static str> {
    let compat = entry.compatible_data.as_ref()?;
    if ignore || (compat.puf && compat.cps) {
        None
    } else if compat.puf {
        Some("PUF")
    } else if compat.cps {
        Some("CPS")
    } else {
        Some("other")
    }
}

fn range_rule(name: &str, entry: &PolicyEntry) -> Option<RangeRule> {
    if entry.value_type == ValueType::Bool {
        return None;
    }
    let bound = |key: &str| match entry.valid_values.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(other) => {
            log::debug!("skipping non-numeric {} bound {} of {}", key, other, name);
            None
        }
        None => None,
    };
    let rule = RangeRule {
        min: bound("min"),
        max: bound("max"),
    };
    if rule.min.is_none() && rule.max.is_none() {
        None
    } else {
        Some(rule)
    }
}

fn scalar(name: &str, year: i32, raw: &serde_json::Value) -> Result<Value> {
    Value::from_json(raw).ok_or_else(|| {
        TaxParamsError::InvalidDefinition(format!(
            "parameter '{}' has a non-scalar value {} in {}",
            name, raw, year
        ))
    })
}

fn convert_entry(name: &str, entry: &PolicyEntry, options: &ConvertOptions) -> Result<ParamDef> {
    let min_year = entry.value_yrs.iter().copied().min().ok_or_else(|| {
        TaxParamsError::InvalidDefinition(format!("parameter '{}' has no value years", name))
    })?;

    let mut base = Labels::new();
    if let Some(source) = data_source_label(entry, options.ignore_data_source) {
        base.insert("data_source".to_string(), source.to_string());
    }

    let mut values = Vec::new();
    for (offset, row) in entry.value.iter().enumerate() {
        let year = min_year + offset as i32;
        match row {
            serde_json::Value::Array(columns) => {
                let vi_name = entry.vi_name.as_deref().filter(|n| !n.is_empty()).ok_or_else(|| {
                    TaxParamsError::InvalidDefinition(format!(
                        "parameter '{}' has vector values but no vi_name",
                        name
                    ))
                })?;
                if columns.len() != entry.vi_vals.len() {
                    return Err(TaxParamsError::InvalidDefinition(format!(
                        "parameter '{}' has {} columns in {} but {} vi_vals",
                        name,
                        columns.len(),
                        year,
                        entry.vi_vals.len()
                    )));
                }
                for (raw, label) in columns.iter().zip(&entry.vi_vals) {
                    let mut labels = base.clone();
                    labels.insert(vi_name.to_string(), label.clone());
                    values.push(
                        ValueObject::new(year, scalar(name, year, raw)?).with_labels(labels),
                    );
                }
            }
            raw => {
                values.push(ValueObject::new(year, scalar(name, year, raw)?).with_labels(base.clone()))
            }
        }
    }

    Ok(ParamDef {
        title: entry.long_name.clone(),
        description: entry.description.clone(),
        notes: entry.notes.clone(),
        section_1: entry.section_1.clone(),
        section_2: entry.section_2.clone(),
        value_type: entry.value_type,
        validators: Validators {
            range: range_rule(name, entry),
            choice: None,
        },
        indexable: entry.indexable,
        indexed: entry.indexable && entry.indexed,
        checkbox: entry.indexable.then_some(entry.indexed),
        value: values,
    })
}

/// Convert a parsed policy document into definitions.
pub fn convert_policy(policy: &serde_json::Value, options: &ConvertOptions) -> Result<Definitions> {
    let entries: BTreeMap<String, PolicyEntry> = serde_json::from_value(policy.clone())?;

    let mut params = BTreeMap::new();
    for (name, entry) in &entries {
        params.insert(name.clone(), convert_entry(name, entry, options)?);
    }
    log::info!("converted {} policy parameters", params.len());

    Ok(Definitions {
        schema: Schema::policy(options.start_year, options.end_year),
        last_known_year: options.last_known_year,
        params,
    })
}

/// Convert a policy document given as a JSON string.
pub fn convert_policy_str(json: &str, options: &ConvertOptions) -> Result<Definitions> {
    let policy: serde_json::Value = serde_json::from_str(json)?;
    convert_policy(&policy, options)
}
