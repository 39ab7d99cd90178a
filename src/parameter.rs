//! Parameter definition and implementation
//!
//! A [`Parameter`] is the runtime description of one policy parameter: its
//! declared type, validators, secondary labels and indexing status. The
//! values themselves live in the [`ValueStore`](crate::store::ValueStore).
//!
//! The indexing status is kept per year: a status change at year `y` governs
//! growth out of `y` and every later year, while growth into `y` keeps the
//! status that was in force before.

use crate::error::{Result, TaxParamsError};
use crate::rates::GrowthBasis;
use crate::schema::{ParamDef, Validators};
use crate::value::ValueType;
use serde::Serialize;
use std::collections::BTreeMap;

/// Indexed status of a parameter over the years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedStatus {
    /// Status before the first change
    initial: bool,

    /// Status changes keyed by the first year they govern
    changes: BTreeMap<i32, bool>,
}

impl IndexedStatus {
    pub fn new(initial: bool) -> Self {
        Self {
            initial,
            changes: BTreeMap::new(),
        }
    }

    /// Status governing growth from `year` to `year + 1`.
    pub fn at(&self, year: i32) -> bool {
        self.changes
            .range(..=year)
            .next_back()
            .map_or(self.initial, |(_, indexed)| *indexed)
    }

    /// Status in force after the last change.
    pub fn current(&self) -> bool {
        self.changes
            .values()
            .next_back()
            .copied()
            .unwrap_or(self.initial)
    }

    pub fn changes(&self) -> &BTreeMap<i32, bool> {
        &self.changes
    }

    /// Switch to `indexed` from `year` on, dropping any later change.
    fn set_from(&mut self, year: i32, indexed: bool) {
        self.changes.retain(|&changed, _| changed < year);
        self.changes.insert(year, indexed);
    }
}

/// A policy parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Name of the parameter
    name: String,

    /// Human readable title
    title: String,

    description: Option<String>,

    /// Declared type of the values
    value_type: ValueType,

    /// Range and choice validators
    validators: Validators,

    /// Names of the secondary labels every value must carry
    labels: Vec<String>,

    /// Whether the indexed status may be changed
    indexable: bool,

    /// Whether extrapolated values grow with the index rate, by year
    indexed: IndexedStatus,

    /// Which index rate drives growth
    basis: GrowthBasis,
}

impl Parameter {
    /// Build the runtime parameter from its definition.
    pub fn from_def(name: &str, def: &ParamDef, basis: GrowthBasis) -> Self {
        Self {
            name: name.to_string(),
            title: def.title.clone(),
            description: def.description.clone(),
            value_type: def.value_type,
            validators: def.validators.clone(),
            labels: def.label_names().into_iter().collect(),
            indexable: def.indexable,
            indexed: IndexedStatus::new(def.indexed),
            basis,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    /// Secondary label names, sorted.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn indexable(&self) -> bool {
        self.indexable
    }

    /// Current indexed status, after every recorded change.
    pub fn indexed(&self) -> bool {
        self.indexed.current()
    }

    /// Indexed status governing growth out of `year`.
    pub fn indexed_at(&self, year: i32) -> bool {
        self.indexed.at(year)
    }

    pub fn indexed_status(&self) -> &IndexedStatus {
        &self.indexed
    }

    pub fn basis(&self) -> GrowthBasis {
        self.basis
    }

    fn check_indexable(&self) -> Result<()> {
        if !self.indexable {
            return Err(TaxParamsError::invalid_operation(
                &self.name,
                "parameter is not indexable",
            ));
        }
        Ok(())
    }

    /// Change the indexed status for every year
    ///
    /// # Returns
    ///
    /// `Ok(())` if the status was changed, or an `InvalidOperation` error if
    /// the parameter is not indexable
    pub fn set_indexed(&mut self, indexed: bool) -> Result<()> {
        self.check_indexable()?;
        self.indexed = IndexedStatus::new(indexed);
        Ok(())
    }

    /// Change the indexed status from `year` on.
    ///
    /// Growth into `year` keeps the earlier status. Changes recorded after
    /// `year` are dropped.
    pub fn set_indexed_from(&mut self, year: i32, indexed: bool) -> Result<()> {
        self.check_indexable()?;
        self.indexed.set_from(year, indexed);
        Ok(())
    }

    pub(crate) fn restore_indexed(&mut self, indexed: IndexedStatus) {
        self.indexed = indexed;
    }
}
