//! # Value Store
//!
//! Holds every parameter's value objects keyed by (secondary labels, year)
//! together with the read-only snapshot of the factory defaults.
//!
//! [`ValueStore::replace`] is the only mutator. Each [`Update::Set`] first
//! removes the value with the same year and labels, so two value objects of
//! one parameter can never share a label assignment. [`Update::Clear`] is the
//! delete marker used to drop values before they are recomputed.

pub mod select;

pub use select::{Comparator, Selector};

use crate::error::{Result, TaxParamsError};
use crate::value::{Labels, Value, ValueObject};
use std::collections::BTreeMap;

/// A stored value and whether extension produced it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    pub(crate) value: Value,
    pub(crate) auto: bool,
}

/// One parameter's values, grouped by label combination and ordered by year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    series: BTreeMap<Labels, BTreeMap<i32, Slot>>,
}

impl ParamValues {
    pub fn from_objects<'a>(objects: impl IntoIterator<Item = &'a ValueObject>) -> Self {
        let mut values = Self::default();
        for vo in objects {
            values.set(vo.clone());
        }
        values
    }

    /// Value at `year` for the label combination `labels`.
    pub fn get(&self, labels: &Labels, year: i32) -> Option<&Value> {
        self.series
            .get(labels)
            .and_then(|years| years.get(&year))
            .map(|slot| &slot.value)
    }

    /// Whether the value at `year`/`labels` was produced by extension.
    pub fn is_auto(&self, labels: &Labels, year: i32) -> Option<bool> {
        self.series
            .get(labels)
            .and_then(|years| years.get(&year))
            .map(|slot| slot.auto)
    }

    /// Label combinations present, in sorted order.
    pub fn combinations(&self) -> impl Iterator<Item = &Labels> {
        self.series.keys()
    }

    pub fn len(&self) -> usize {
        self.series.values().map(|years| years.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// All value objects, ordered by labels then year.
    pub fn objects(&self) -> Vec<ValueObject> {
        self.series
            .iter()
            .flat_map(|(labels, years)| {
                years.iter().map(move |(year, slot)| ValueObject {
                    year: *year,
                    labels: labels.clone(),
                    value: slot.value.clone(),
                    auto: slot.auto,
                })
            })
            .collect()
    }

    pub(crate) fn series_mut(&mut self) -> impl Iterator<Item = (&Labels, &mut BTreeMap<i32, Slot>)> {
        self.series.iter_mut()
    }

    pub(crate) fn series(&self) -> impl Iterator<Item = (&Labels, &BTreeMap<i32, Slot>)> {
        self.series.iter()
    }

    fn set(&mut self, vo: ValueObject) {
        self.series.entry(vo.labels).or_default().insert(
            vo.year,
            Slot {
                value: vo.value,
                auto: vo.auto,
            },
        );
    }

    fn clear(&mut self, labels: &Labels, year: i32) -> bool {
        let Some(years) = self.series.get_mut(labels) else {
            return false;
        };
        let removed = years.remove(&year).is_some();
        if years.is_empty() {
            self.series.remove(labels);
        }
        removed
    }
}

/// A single write against the value store.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Insert the value object, replacing the one with the same year and labels.
    Set(ValueObject),
    /// Remove the value with this year and labels (the delete marker).
    Clear { year: i32, labels: Labels },
}

impl Update {
    /// Delete marker for an existing value object.
    pub fn clear(vo: &ValueObject) -> Self {
        Update::Clear {
            year: vo.year,
            labels: vo.labels.clone(),
        }
    }
}

/// Value objects of every parameter plus the Initial Defaults snapshot.
#[derive(Debug, Clone)]
pub struct ValueStore {
    values: BTreeMap<String, ParamValues>,
    defaults: BTreeMap<String, Vec<ValueObject>>,
}

impl ValueStore {
    /// Create a store whose current values are the given defaults.
    ///
    /// The defaults are captured once and never change afterwards.
    pub fn new(defaults: BTreeMap<String, Vec<ValueObject>>) -> Self {
        let values = defaults
            .iter()
            .map(|(name, vos)| (name.clone(), ParamValues::from_objects(vos)))
            .collect();
        Self { values, defaults }
    }

    pub fn contains(&self, param: &str) -> bool {
        self.values.contains_key(param)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn values(&self, param: &str) -> Result<&ParamValues> {
        self.values
            .get(param)
            .ok_or_else(|| TaxParamsError::ParameterNotFound(param.to_string()))
    }

    pub(crate) fn values_mut(&mut self, param: &str) -> Result<&mut ParamValues> {
        self.values
            .get_mut(param)
            .ok_or_else(|| TaxParamsError::ParameterNotFound(param.to_string()))
    }

    /// Select the value objects of `param` matching `selector`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use taxparams_rs::store::{Selector, ValueStore};
    /// use taxparams_rs::{Value, ValueObject};
    ///
    /// let mut defaults = BTreeMap::new();
    /// defaults.insert(
    ///     "II_em".to_string(),
    ///     vec![
    ///         ValueObject::new(2013, Value::Float(3900.0)),
    ///         ValueObject::new(2014, Value::Float(3950.0)),
    ///     ],
    /// );
    /// let store = ValueStore::new(defaults);
    ///
    /// let later = store.select("II_em", &Selector::gt(2013)).unwrap();
    /// assert_eq!(later.len(), 1);
    /// assert_eq!(later[0].value, Value::Float(3950.0));
    /// ```
    pub fn select(&self, param: &str, selector: &Selector) -> Result<Vec<ValueObject>> {
        let values = self.values(param)?;
        Ok(values
            .series
            .iter()
            .filter(|(labels, _)| selector.matches_labels(labels))
            .flat_map(|(labels, years)| {
                years
                    .iter()
                    .filter(move |(year, slot)| selector.matches(**year, labels, slot.auto))
                    .map(move |(year, slot)| ValueObject {
                        year: *year,
                        labels: labels.clone(),
                        value: slot.value.clone(),
                        auto: slot.auto,
                    })
            })
            .collect())
    }

    /// Apply `updates` in order. Returns the number of values written or removed.
    pub fn replace(
        &mut self,
        param: &str,
        updates: impl IntoIterator<Item = Update>,
    ) -> Result<usize> {
        let values = self.values_mut(param)?;
        let mut touched = 0;
        for update in updates {
            match update {
                Update::Set(vo) => {
                    values.set(vo);
                    touched += 1;
                }
                Update::Clear { year, labels } => {
                    if values.clear(&labels, year) {
                        touched += 1;
                    }
                }
            }
        }
        Ok(touched)
    }

    /// Remove every value of `param` matching `selector`.
    pub fn clear(&mut self, param: &str, selector: &Selector) -> Result<usize> {
        let doomed = self.select(param, selector)?;
        self.replace(param, doomed.iter().map(Update::clear))
    }

    /// The Initial Defaults of `param`.
    pub fn get_default(&self, param: &str) -> Result<&[ValueObject]> {
        self.defaults
            .get(param)
            .map(|vos| vos.as_slice())
            .ok_or_else(|| TaxParamsError::ParameterNotFound(param.to_string()))
    }

    pub(crate) fn checkpoint(&self) -> BTreeMap<String, ParamValues> {
        self.values.clone()
    }

    pub(crate) fn restore(&mut self, values: BTreeMap<String, ParamValues>) {
        self.values = values;
    }
}
