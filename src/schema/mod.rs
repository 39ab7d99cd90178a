//! # Parameter definitions
//!
//! The definitions are the external description of every parameter: its
//! declared type, validators, whether it is indexable, its default indexed
//! status and its default time series. They are consumed once when a
//! [`TaxParams`](crate::TaxParams) store is built.
//!
//! The JSON layout follows the paramtools convention:
//!
//! ```json
//! {
//!   "schema": {"start_year": 2013, "end_year": 2029, "labels": {"MARS": ["single", "mjoint"]}},
//!   "last_known_year": 2026,
//!   "params": {
//!     "II_em": {
//!       "title": "Personal and dependent exemption amount",
//!       "type": "float",
//!       "indexable": true,
//!       "indexed": true,
//!       "validators": {"range": {"min": 0}},
//!       "value": [{"year": 2013, "value": 3900}]
//!     }
//!   }
//! }
//! ```
//!
//! Tax-Calculator style policy files can be converted with [`convert`].

pub mod convert;
pub mod validate;

use crate::error::{Result, TaxParamsError};
use crate::value::{Labels, Value, ValueObject, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

/// Label schema: the year horizon and the choices of every secondary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub labels: BTreeMap<String, Vec<String>>,
}

impl Schema {
    /// The label schema used by the individual income tax policy parameters.
    pub fn policy(start_year: i32, end_year: i32) -> Self {
        fn choices(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        let mut labels = BTreeMap::new();
        labels.insert(
            "MARS".to_string(),
            choices(&["single", "mjoint", "mseparate", "headhh", "widow"]),
        );
        labels.insert(
            "idedtype".to_string(),
            choices(&["med", "sltx", "retx", "cas", "misc", "int", "char"]),
        );
        labels.insert(
            "EIC".to_string(),
            choices(&["0kids", "1kid", "2kids", "3+kids"]),
        );
        labels.insert(
            "data_source".to_string(),
            choices(&["PUF", "CPS", "other"]),
        );
        Self {
            start_year,
            end_year,
            labels,
        }
    }

    /// Supported years, inclusive.
    pub fn horizon(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }
}

/// Numeric range validator. Missing bounds are unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Allowed values validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRule {
    pub choices: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validators {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<ChoiceRule>,
}

/// Definition of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_2: Option<String>,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    #[serde(default)]
    pub validators: Validators,

    #[serde(default)]
    pub indexable: bool,

    #[serde(default)]
    pub indexed: bool,

    /// UI hint mirroring the default indexed status of indexable parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox: Option<bool>,

    /// Default time series.
    pub value: Vec<ValueObject>,
}

impl ParamDef {
    /// Names of the secondary labels used by the default values.
    pub fn label_names(&self) -> BTreeSet<String> {
        self.value
            .iter()
            .flat_map(|vo| vo.labels.keys().cloned())
            .collect()
    }
}

/// Everything needed to build a parameter store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    pub schema: Schema,

    /// Latest year whose default values are statutory rather than inflated.
    ///
    /// Defaults after this year are recomputed when the CPI offset changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_year: Option<i32>,

    pub params: BTreeMap<String, ParamDef>,
}

impl Definitions {
    /// Load definitions from a JSON string
    ///
    /// # Examples
    ///
    /// ```
    /// use taxparams_rs::schema::Definitions;
    ///
    /// let json = r#"{
    ///   "schema": {"start_year": 2013, "end_year": 2015},
    ///   "params": {
    ///     "CPI_offset": {"type": "float", "value": [{"year": 2013, "value": 0.0}]}
    ///   }
    /// }"#;
    ///
    /// let defs = Definitions::from_json(json).unwrap();
    /// assert_eq!(defs.params.len(), 1);
    /// assert_eq!(defs.schema.horizon(), 2013..=2015);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load definitions from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Serialize the definitions to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the structural consistency of the definitions.
    ///
    /// Every parameter must have defaults, use only known labels, use the same
    /// label names for all of its values, and give every label combination a
    /// value in the first horizon year so that extension can fill the rest.
    pub fn check(&self) -> Result<()> {
        let schema = &self.schema;
        if schema.start_year > schema.end_year {
            return Err(TaxParamsError::InvalidDefinition(format!(
                "start year {} is after end year {}",
                schema.start_year, schema.end_year
            )));
        }

        for (name, def) in &self.params {
            if def.value.is_empty() {
                return Err(TaxParamsError::InvalidDefinition(format!(
                    "parameter '{}' has no default values",
                    name
                )));
            }
            if def.indexed && !def.indexable {
                return Err(TaxParamsError::InvalidDefinition(format!(
                    "parameter '{}' is indexed but not indexable",
                    name
                )));
            }

            let label_names = def.label_names();
            if let Some(unknown) = label_names.iter().find(|l| !schema.labels.contains_key(*l)) {
                return Err(TaxParamsError::InvalidDefinition(format!(
                    "parameter '{}' uses unknown label '{}'",
                    name, unknown
                )));
            }

            let mut first_years: BTreeMap<&Labels, i32> = BTreeMap::new();
            for vo in &def.value {
                if vo.labels.len() != label_names.len() {
                    return Err(TaxParamsError::InvalidDefinition(format!(
                        "parameter '{}' mixes label sets in its defaults (year {})",
                        name, vo.year
                    )));
                }
                let first = first_years.entry(&vo.labels).or_insert(vo.year);
                *first = (*first).min(vo.year);
            }
            if let Some((labels, year)) = first_years
                .iter()
                .find(|(_, year)| **year > schema.start_year)
            {
                return Err(TaxParamsError::InvalidDefinition(format!(
                    "parameter '{}' has no default for {} in {} (first value in {})",
                    name,
                    describe_labels(labels),
                    schema.start_year,
                    year
                )));
            }
        }
        Ok(())
    }
}

/// Human readable label assignment, e.g. `EIC=0kids`.
pub(crate) fn describe_labels(labels: &Labels) -> String {
    if labels.is_empty() {
        return "all labels".to_string();
    }
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}
