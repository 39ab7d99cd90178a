//! Validation of candidate value objects
//!
//! The [`Validator`] trait is the seam to the schema checking collaborator.
//! [`SchemaValidator`] is the default implementation: it checks the year
//! range, label names and choices, the value type, and the range and choice
//! validators of the parameter. Every violation is reported, not just the
//! first one.

use crate::parameter::Parameter;
use crate::schema::{describe_labels, Schema};
use crate::value::ValueObject;
use std::collections::BTreeMap;
use std::fmt;

/// Validation messages grouped by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, param: &str, message: impl Into<String>) {
        self.errors
            .entry(param.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn extend(&mut self, param: &str, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            self.push(param, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of messages.
    pub fn len(&self) -> usize {
        self.errors.values().map(|m| m.len()).sum()
    }

    pub fn get(&self, param: &str) -> Option<&[String]> {
        self.errors.get(param).map(|m| m.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (param, messages) in &self.errors {
            for message in messages {
                writeln!(f, "  {}: {}", param, message)?;
            }
        }
        Ok(())
    }
}

/// Checks candidate value objects against a parameter's schema.
pub trait Validator: fmt::Debug {
    /// Validate `candidates` for `param`, coercing values to the declared
    /// type in place. Returns one message per violation.
    fn validate(
        &self,
        schema: &Schema,
        param: &Parameter,
        candidates: &mut [ValueObject],
    ) -> Vec<String>;
}

/// Default schema validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    fn check_labels(&self, schema: &Schema, param: &Parameter, vo: &ValueObject, out: &mut Vec<String>) {
        let at = describe_at(vo);
        for name in vo.labels.keys() {
            if !param.labels().contains(name) {
                out.push(format!("{}: unexpected label '{}'", at, name));
            }
        }
        for name in param.labels() {
            match vo.labels.get(name) {
                None => out.push(format!("{}: missing label '{}'", at, name)),
                Some(choice) => {
                    let valid = schema
                        .labels
                        .get(name)
                        .map_or(false, |choices| choices.contains(choice));
                    if !valid {
                        out.push(format!(
                            "{}: '{}' is not a valid choice for label '{}'",
                            at, choice, name
                        ));
                    }
                }
            }
        }
    }

    fn check_value(&self, param: &Parameter, vo: &ValueObject, out: &mut Vec<String>) {
        let at = describe_at(vo);
        let validators = param.validators();
        if let (Some(range), Some(v)) = (&validators.range, vo.value.as_f64()) {
            if let Some(min) = range.min {
                if v < min {
                    out.push(format!("{}: value {} is below the minimum {}", at, v, min));
                }
            }
            if let Some(max) = range.max {
                if v > max {
                    out.push(format!("{}: value {} is above the maximum {}", at, v, max));
                }
            }
        }
        if let Some(choice) = &validators.choice {
            if !choice.choices.contains(&vo.value) {
                out.push(format!("{}: {} is not an allowed value", at, vo.value));
            }
        }
    }
}

impl Validator for SchemaValidator {
    fn validate(
        &self,
        schema: &Schema,
        param: &Parameter,
        candidates: &mut [ValueObject],
    ) -> Vec<String> {
        let mut out = Vec::new();
        for vo in candidates.iter_mut() {
            if !schema.horizon().contains(&vo.year) {
                out.push(format!(
                    "year {} is outside the supported range {}..={}",
                    vo.year, schema.start_year, schema.end_year
                ));
            }
            self.check_labels(schema, param, vo, &mut out);

            match vo.value.coerce(param.value_type()) {
                Some(value) => {
                    vo.value = value;
                    self.check_value(param, vo, &mut out);
                }
                None => out.push(format!(
                    "{}: expected a {} value, got {}",
                    describe_at(vo),
                    param.value_type(),
                    vo.value
                )),
            }
        }
        out
    }
}

fn describe_at(vo: &ValueObject) -> String {
    if vo.labels.is_empty() {
        format!("year {}", vo.year)
    } else {
        format!("year {} ({})", vo.year, describe_labels(&vo.labels))
    }
}
