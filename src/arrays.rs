//! Dense array views of parameter values
//!
//! Every numeric or boolean parameter has a two dimensional view: one row per
//! horizon year and one column per label combination, in sorted label order.
//! Booleans are stored as 0/1 and missing cells as NaN. String parameters
//! have no view.
//!
//! Views are derived data. They are only rebuilt by a final-phase extension,
//! so they may lag behind the values while an adjustment is running.

use crate::store::ParamValues;
use crate::value::Labels;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// The array view of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamArray {
    first_year: i32,
    columns: Vec<Labels>,
    data: Array2<f64>,
}

impl ParamArray {
    /// Build the view from a parameter's values.
    ///
    /// Returns `None` if any value has no numeric form.
    pub fn from_values(values: &ParamValues, horizon: RangeInclusive<i32>) -> Option<Self> {
        let first_year = *horizon.start();
        let rows = horizon.clone().count();
        let columns: Vec<Labels> = values.combinations().cloned().collect();
        let mut data = Array2::from_elem((rows, columns.len()), f64::NAN);

        for (col, (_, years)) in values.series().enumerate() {
            for (year, slot) in years.range(horizon.clone()) {
                let cell = slot.value.as_cell()?;
                data[[(*year - first_year) as usize, col]] = cell;
            }
        }

        Some(Self {
            first_year,
            columns,
            data,
        })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Label combination of each column.
    pub fn columns(&self) -> &[Labels] {
        &self.columns
    }

    /// The row of one year, or `None` outside the horizon.
    pub fn row(&self, year: i32) -> Option<Array1<f64>> {
        let index = year.checked_sub(self.first_year)?;
        if index < 0 || index as usize >= self.data.nrows() {
            return None;
        }
        Some(self.data.row(index as usize).to_owned())
    }
}

/// Array views of all parameters, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayViews {
    views: BTreeMap<String, ParamArray>,
}

impl ArrayViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the view of `name` from its current values.
    pub fn refresh(&mut self, name: &str, values: &ParamValues, horizon: RangeInclusive<i32>) {
        match ParamArray::from_values(values, horizon) {
            Some(view) => {
                self.views.insert(name.to_string(), view);
            }
            None => {
                self.views.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamArray> {
        self.views.get(name)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
