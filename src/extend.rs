//! # Extension Engine
//!
//! Fills the missing years of a parameter. For every label combination the
//! years of the requested range are walked in ascending order. A year that
//! already has a value becomes the running value; a missing year is filled
//! from the running value, grown by the index rate of the previous year when
//! the parameter is indexed in that year and the value is a float, and
//! carried forward unchanged otherwise.
//!
//! Existing values are never overwritten and nothing is rounded along the
//! chain, so extending twice without an intervening change is a no-op.

use crate::arrays::ArrayViews;
use crate::error::{Result, TaxParamsError};
use crate::parameter::Parameter;
use crate::rates::IndexRates;
use crate::store::{ParamValues, Slot, ValueStore};
use crate::value::Value;
use std::ops::RangeInclusive;

/// Whether an extension is a step inside a larger operation or its last word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Write values only.
    Intermediate,
    /// Write values and rebuild the derived array view.
    Final,
}

/// Value of `year + 1` given the value of `year`.
fn grow(param: &Parameter, rates: &IndexRates, year: i32, value: &Value) -> Result<Value> {
    match value {
        Value::Float(v) if param.indexed_at(year) => {
            let rate = rates.rate_for(param.name(), year).ok_or_else(|| {
                TaxParamsError::RateUnavailable(format!(
                    "no {:?} rate for {} (extending '{}')",
                    param.basis(),
                    year,
                    param.name()
                ))
            })?;
            Ok(Value::Float(v * (1.0 + rate)))
        }
        other => Ok(other.clone()),
    }
}

/// Fill the missing years of `values` within `years`.
///
/// The seed of each label combination is its latest value before the range;
/// years between the seed and the range are compounded but not written.
/// Returns the number of values added.
pub fn extend_values(
    values: &mut ParamValues,
    param: &Parameter,
    rates: &IndexRates,
    years: RangeInclusive<i32>,
) -> Result<usize> {
    let (start, end) = (*years.start(), *years.end());
    let mut added = 0;

    for (_, series) in values.series_mut() {
        let mut running: Option<(i32, Value)> = series
            .range(..start)
            .next_back()
            .map(|(year, slot)| (*year, slot.value.clone()));
        let from = running.as_ref().map_or(start, |(year, _)| year + 1);

        for year in from..=end {
            if let Some(slot) = series.get(&year) {
                running = Some((year, slot.value.clone()));
                continue;
            }
            let Some((prev_year, prev)) = running.take() else {
                continue;
            };
            let next = grow(param, rates, prev_year, &prev)?;
            if year >= start {
                series.insert(
                    year,
                    Slot {
                        value: next.clone(),
                        auto: true,
                    },
                );
                added += 1;
            }
            running = Some((year, next));
        }
    }
    Ok(added)
}

/// Extension bound to one store, its array views and a set of rates.
#[derive(Debug)]
pub struct ExtensionEngine<'a> {
    store: &'a mut ValueStore,
    views: &'a mut ArrayViews,
    rates: &'a IndexRates,
    horizon: RangeInclusive<i32>,
}

impl<'a> ExtensionEngine<'a> {
    pub fn new(
        store: &'a mut ValueStore,
        views: &'a mut ArrayViews,
        rates: &'a IndexRates,
        horizon: RangeInclusive<i32>,
    ) -> Self {
        Self {
            store,
            views,
            rates,
            horizon,
        }
    }

    /// Extend `param` over `years`, clamped to the horizon.
    pub fn extend(
        &mut self,
        param: &Parameter,
        years: RangeInclusive<i32>,
        phase: Phase,
    ) -> Result<usize> {
        let start = (*years.start()).max(*self.horizon.start());
        let end = (*years.end()).min(*self.horizon.end());

        let values = self.store.values_mut(param.name())?;
        let added = if start <= end {
            extend_values(values, param, self.rates, start..=end)?
        } else {
            0
        };

        if phase == Phase::Final {
            self.views
                .refresh(param.name(), values, self.horizon.clone());
        }
        if added > 0 {
            log::debug!(
                "extended '{}' over {}..={}: {} values added ({:?})",
                param.name(),
                start,
                end,
                added,
                phase
            );
        }
        Ok(added)
    }
}
