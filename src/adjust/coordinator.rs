//! The `adjust` operation.
//!
//! An adjustment runs in two stages. Planning parses the payload, resolves
//! scalars, checks names and indexability and validates every value; it does
//! not touch the store. Execution then applies the plan in a fixed order:
//!
//! 1. CPI offset: apply the offset values, recompute the rates and reset
//!    the indexed parameters from the first year whose offset changed.
//! 2. Indexed status: apply each status change in (year, parameter) order,
//!    extending up to the change year under the status in force before it
//!    and past it under the new one.
//! 3. Plain values: apply the remaining value changes and extend.
//! 4. Consistency: re-extend every parameter reset or re-indexed above.
//!
//! Execution works against a checkpoint. If any step fails the store is
//! restored and the error returned.

use crate::adjust::payload::{Payload, RawValues};
use crate::adjust::Report;
use crate::error::{Result, TaxParamsError};
use crate::extend::Phase;
use crate::params::TaxParams;
use crate::rates::offset_at;
use crate::schema::describe_labels;
use crate::schema::validate::ValidationErrors;
use crate::store::{Selector, Update};
use crate::value::{Value, ValueObject};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

/// A validated adjustment, ready to execute.
#[derive(Debug, Default)]
struct Plan {
    offset: Option<Vec<ValueObject>>,
    status: BTreeMap<String, BTreeMap<i32, bool>>,
    values: BTreeMap<String, Vec<ValueObject>>,
}

/// Offset reset postponed until a parameter's own values are applied.
#[derive(Debug, Clone, Copy)]
struct Reset {
    first_changed: i32,
    restore_through: i32,
}

/// Earliest horizon year whose effective CPI offset differs.
fn first_changed_year(
    before: &BTreeMap<i32, f64>,
    after: &BTreeMap<i32, f64>,
    horizon: RangeInclusive<i32>,
) -> Option<i32> {
    horizon.into_iter().find(|&year| offset_at(before, year) != offset_at(after, year))
}

impl TaxParams {
    /// Apply an adjustment payload.
    ///
    /// Returns the explicit values that were applied, keyed by payload name.
    /// On error nothing is changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use taxparams_rs::TaxParams;
    ///
    /// let mut params = TaxParams::bundled().unwrap();
    /// let report = params
    ///     .adjust(&json!({"II_em": [{"year": 2020, "value": 5000.0}], "II_em-indexed": false}))
    ///     .unwrap();
    /// assert!(report.contains_key("II_em-indexed"));
    /// assert_eq!(params.is_indexed("II_em"), Some(false));
    /// ```
    pub fn adjust(&mut self, payload: &serde_json::Value) -> Result<Report> {
        let parsed = Payload::parse(payload, &self.config, self.schema.start_year)?;
        if parsed.is_empty() {
            return Ok(Report::new());
        }
        let plan = self.plan(parsed)?;
        log::info!(
            "adjusting {} value and {} indexed-status entries{}",
            plan.values.len(),
            plan.status.len(),
            if plan.offset.is_some() { " with a CPI offset change" } else { "" }
        );

        let checkpoint = self.checkpoint();
        match self.execute(plan) {
            Ok(report) => Ok(report),
            Err(err) => {
                log::warn!("adjustment failed, restoring previous state: {}", err);
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    /// Apply an adjustment given as a JSON string.
    pub fn adjust_json(&mut self, json: &str) -> Result<Report> {
        let payload: serde_json::Value = serde_json::from_str(json)?;
        self.adjust(&payload)
    }

    /// Apply an adjustment read from a JSON file.
    pub fn adjust_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Report> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        self.adjust_json(&contents)
    }

    fn plan(&self, parsed: Payload) -> Result<Plan> {
        let mut plan = Plan::default();

        for (name, changes) in parsed.indexed {
            let param = self.params.get(&name).ok_or_else(|| {
                TaxParamsError::invalid_operation(&name, "unknown parameter cannot be indexed")
            })?;
            if !param.indexable() {
                return Err(TaxParamsError::invalid_operation(
                    &name,
                    "parameter is not indexable",
                ));
            }
            plan.status.insert(name, changes);
        }

        let mut errors = ValidationErrors::new();
        for (name, raw) in parsed.values {
            let Some(param) = self.params.get(&name) else {
                errors.push(&name, "unknown parameter");
                continue;
            };
            let mut entries = match raw {
                RawValues::Entries(entries) => entries,
                RawValues::Scalar(value) => self
                    .store
                    .values(&name)?
                    .combinations()
                    .map(|labels| {
                        ValueObject::new(self.schema.start_year, value.clone())
                            .with_labels(labels.clone())
                    })
                    .collect(),
            };
            errors.extend(
                &name,
                self.validator.validate(&self.schema, param, &mut entries),
            );
            let values = self.store.values(&name)?;
            for vo in &entries {
                if !values.combinations().any(|labels| *labels == vo.labels) {
                    errors.push(
                        &name,
                        format!(
                            "year {}: no values exist for {}",
                            vo.year,
                            describe_labels(&vo.labels)
                        ),
                    );
                }
            }
            entries.sort_by_key(|vo| vo.year);

            if name == self.config.cpi_offset_param {
                plan.offset = Some(entries);
            } else {
                plan.values.insert(name, entries);
            }
        }
        errors.into_result()?;
        Ok(plan)
    }

    /// Write explicit values and drop the extrapolated values after the
    /// earliest of them.
    fn apply_explicit(&mut self, name: &str, entries: &[ValueObject]) -> Result<()> {
        let Some(earliest) = entries.iter().map(|vo| vo.year).min() else {
            return Ok(());
        };
        self.store.replace(
            name,
            entries.iter().cloned().map(|mut vo| {
                vo.auto = false;
                Update::Set(vo)
            }),
        )?;
        self.store
            .clear(name, &Selector::gt(earliest).extrapolated_only())?;
        Ok(())
    }

    /// Drop the values after `first_changed` and restore the Initial Defaults
    /// up to `restore_through`.
    fn reset_after(&mut self, name: &str, reset: Reset) -> Result<()> {
        let cleared = self.store.clear(name, &Selector::gt(reset.first_changed))?;
        let restored: Vec<Update> = self
            .store
            .get_default(name)?
            .iter()
            .filter(|vo| vo.year > reset.first_changed && vo.year <= reset.restore_through)
            .cloned()
            .map(Update::Set)
            .collect();
        let count = restored.len();
        self.store.replace(name, restored)?;
        log::debug!(
            "reset '{}' after {}: {} values cleared, {} defaults restored",
            name,
            reset.first_changed,
            cleared,
            count
        );
        Ok(())
    }

    fn execute(&mut self, plan: Plan) -> Result<Report> {
        let horizon = self.horizon();
        let mut report = Report::new();
        let mut needs_extension: BTreeSet<String> = BTreeSet::new();
        let mut deferred: BTreeMap<String, Reset> = BTreeMap::new();

        // CPI offset
        if let Some(entries) = plan.offset {
            let cpi = self.config.cpi_offset_param.clone();
            let before = self.offset_series()?;
            self.apply_explicit(&cpi, &entries)?;
            self.extend_param(&cpi, horizon.clone(), Phase::Final)?;
            self.rates.invalidate();
            let after = self.offset_series()?;

            if let Some(first_changed) = first_changed_year(&before, &after, horizon.clone()) {
                self.rates.recompute(&after)?;
                let reset = Reset {
                    first_changed,
                    restore_through: self
                        .last_known_year
                        .map_or(first_changed, |y| y.max(first_changed)),
                };
                let indexed: Vec<String> = self
                    .params
                    .values()
                    .filter(|p| p.indexed() && p.name() != cpi)
                    .map(|p| p.name().to_string())
                    .collect();
                log::info!(
                    "CPI offset changes from {}: resetting {} indexed parameters",
                    first_changed,
                    indexed.len()
                );
                for name in indexed {
                    if plan.values.contains_key(&name) {
                        deferred.insert(name, reset);
                    } else {
                        self.reset_after(&name, reset)?;
                        needs_extension.insert(name);
                    }
                }
            } else {
                log::debug!("CPI offset unchanged in effect, no reset needed");
            }
            report.insert(cpi, entries);
        }

        // Indexed status
        let mut changes: Vec<(i32, &String, bool)> = plan
            .status
            .iter()
            .flat_map(|(name, by_year)| by_year.iter().map(move |(year, b)| (*year, name, *b)))
            .collect();
        changes.sort();

        let mut started: BTreeSet<&String> = BTreeSet::new();
        for (year, name, indexed) in changes {
            let entries = plan.values.get(name).map(|e| e.as_slice()).unwrap_or(&[]);
            if started.insert(name) {
                if let Some(reset) = deferred.remove(name) {
                    self.reset_after(name, reset)?;
                }
                let earlier: Vec<ValueObject> =
                    entries.iter().filter(|vo| vo.year < year).cloned().collect();
                self.apply_explicit(name, &earlier)?;
            }

            self.store.clear(name, &Selector::gt(year))?;
            self.extend_param(name, *horizon.start()..=year, Phase::Intermediate)?;

            self.params
                .get_mut(name)
                .ok_or_else(|| TaxParamsError::ParameterNotFound(name.clone()))?
                .set_indexed_from(year, indexed)?;
            log::debug!("'{}' indexed status set to {} from {}", name, indexed, year);

            let later: Vec<Update> = entries
                .iter()
                .filter(|vo| vo.year >= year)
                .cloned()
                .map(|mut vo| {
                    vo.auto = false;
                    Update::Set(vo)
                })
                .collect();
            self.store.replace(name, later)?;
            self.extend_param(name, horizon.clone(), Phase::Intermediate)?;
            needs_extension.insert(name.clone());
        }

        // Plain values
        for (name, entries) in &plan.values {
            if plan.status.contains_key(name) {
                continue;
            }
            if let Some(reset) = deferred.remove(name) {
                self.reset_after(name, reset)?;
            }
            self.apply_explicit(name, entries)?;
            self.extend_param(name, horizon.clone(), Phase::Final)?;
            needs_extension.remove(name);
        }

        // Consistency
        for name in &needs_extension {
            self.extend_param(name, horizon.clone(), Phase::Final)?;
        }

        for (name, entries) in plan.values {
            report.insert(name, entries);
        }
        for (name, by_year) in plan.status {
            let entries = by_year
                .into_iter()
                .map(|(year, indexed)| ValueObject::new(year, Value::Bool(indexed)))
                .collect();
            report.insert(format!("{}{}", name, self.config.indexed_suffix), entries);
        }
        Ok(report)
    }
}
