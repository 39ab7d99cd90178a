//! # Parameter Store
//!
//! [`TaxParams`] owns everything that makes up a set of policy parameters:
//! the runtime parameter descriptions, the value store with its Initial
//! Defaults, the rate cache and the array views. It is built once from
//! [`Definitions`] and a [`RateForecast`], after which every label
//! combination of every parameter has exactly one value for every horizon
//! year. [`TaxParams::adjust`] keeps it that way.

use crate::arrays::{ArrayViews, ParamArray};
use crate::config::StoreConfig;
use crate::error::{Result, TaxParamsError};
use crate::extend::{ExtensionEngine, Phase};
use crate::parameter::{IndexedStatus, Parameter};
use crate::rates::{GrowthBasis, IndexRates, RateForecast, RateProvider, StaticForecast};
use crate::schema::convert::{convert_policy_str, ConvertOptions};
use crate::schema::validate::{SchemaValidator, ValidationErrors, Validator};
use crate::schema::{Definitions, Schema};
use crate::store::{ParamValues, Selector, ValueStore};
use crate::value::{Labels, Value, ValueObject, ValueType};
use ndarray::Array1;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

const BUNDLED_POLICY: &str = include_str!("../data/policy_current_law.json");

/// Horizon and latest statutory year of the bundled policy subset.
const BUNDLED_OPTIONS: &str = include_str!("../data/policy_options.json");

/// State captured before an adjustment is executed.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    values: BTreeMap<String, ParamValues>,
    indexed: BTreeMap<String, IndexedStatus>,
    rates: Option<IndexRates>,
    views: ArrayViews,
}

/// A store of year-indexed policy parameters.
#[derive(Debug)]
pub struct TaxParams {
    pub(crate) config: StoreConfig,
    pub(crate) schema: Schema,
    pub(crate) last_known_year: Option<i32>,
    pub(crate) params: BTreeMap<String, Parameter>,
    pub(crate) store: ValueStore,
    pub(crate) rates: RateProvider,
    pub(crate) views: ArrayViews,
    pub(crate) validator: Box<dyn Validator>,
}

/// CPI offset series as stored, keyed by year.
pub(crate) fn offset_series(store: &ValueStore, name: &str) -> Result<BTreeMap<i32, f64>> {
    if !store.contains(name) {
        return Ok(BTreeMap::new());
    }
    store
        .select(name, &Selector::all())?
        .into_iter()
        .map(|vo| {
            vo.value.as_f64().map(|v| (vo.year, v)).ok_or_else(|| {
                TaxParamsError::InvalidDefinition(format!(
                    "CPI offset '{}' has a non-numeric value in {}",
                    name, vo.year
                ))
            })
        })
        .collect()
}

impl TaxParams {
    /// Build a store with the default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use taxparams_rs::rates::StaticForecast;
    /// use taxparams_rs::schema::Definitions;
    /// use taxparams_rs::TaxParams;
    ///
    /// let defs = Definitions::from_json(r#"{
    ///   "schema": {"start_year": 2013, "end_year": 2015},
    ///   "params": {
    ///     "CPI_offset": {"type": "float", "value": [{"year": 2013, "value": 0.0}]},
    ///     "II_em": {"type": "float", "indexable": true, "indexed": true,
    ///               "value": [{"year": 2013, "value": 1000}]}
    ///   }
    /// }"#).unwrap();
    /// let forecast = StaticForecast::new(2013, vec![0.02, 0.02, 0.02], vec![0.03, 0.03, 0.03]);
    ///
    /// let params = TaxParams::new(defs, forecast).unwrap();
    /// assert_eq!(params.select("II_em", &Default::default()).unwrap().len(), 3);
    /// ```
    pub fn new(defs: Definitions, forecast: impl RateForecast + 'static) -> Result<Self> {
        Self::with_config(defs, forecast, StoreConfig::default())
    }

    pub fn with_config(
        defs: Definitions,
        forecast: impl RateForecast + 'static,
        config: StoreConfig,
    ) -> Result<Self> {
        Self::build(defs, Box::new(forecast), config, Box::new(SchemaValidator))
    }

    /// Build a store that checks values with a custom validator.
    pub fn with_validator(
        defs: Definitions,
        forecast: impl RateForecast + 'static,
        config: StoreConfig,
        validator: impl Validator + 'static,
    ) -> Result<Self> {
        Self::build(defs, Box::new(forecast), config, Box::new(validator))
    }

    /// The policy subset and growth forecast shipped with the crate.
    pub fn bundled() -> Result<Self> {
        let options = ConvertOptions::from_json(BUNDLED_OPTIONS)?;
        let defs = convert_policy_str(BUNDLED_POLICY, &options)?;
        Self::new(defs, StaticForecast::bundled()?)
    }

    fn build(
        defs: Definitions,
        forecast: Box<dyn RateForecast>,
        config: StoreConfig,
        validator: Box<dyn Validator>,
    ) -> Result<Self> {
        defs.check()?;
        if let Some(offset) = defs.params.get(&config.cpi_offset_param) {
            if offset.indexable
                || offset.value_type != ValueType::Float
                || !offset.label_names().is_empty()
            {
                return Err(TaxParamsError::InvalidDefinition(format!(
                    "CPI offset '{}' must be an unlabeled, non-indexable float",
                    config.cpi_offset_param
                )));
            }
        }

        let mut params = BTreeMap::new();
        let mut defaults = BTreeMap::new();
        let mut errors = ValidationErrors::new();
        for (name, def) in &defs.params {
            let basis = if config.wage_indexed.contains(name) {
                GrowthBasis::Wage
            } else {
                GrowthBasis::Price
            };
            let param = Parameter::from_def(name, def, basis);
            let mut values = def.value.clone();
            for vo in values.iter_mut() {
                vo.auto = false;
            }
            errors.extend(name, validator.validate(&defs.schema, &param, &mut values));
            params.insert(name.clone(), param);
            defaults.insert(name.clone(), values);
        }
        errors.into_result()?;

        let schema = defs.schema;
        let rates = RateProvider::new(
            forecast,
            config.wage_indexed.clone(),
            config.rate_precision,
            schema.start_year,
            schema.end_year,
        );
        let mut tp = Self {
            config,
            last_known_year: defs.last_known_year,
            params,
            store: ValueStore::new(defaults),
            rates,
            views: ArrayViews::new(),
            validator,
            schema,
        };

        let horizon = tp.horizon();
        let names: Vec<String> = tp.params.keys().cloned().collect();
        for name in &names {
            tp.extend_param(name, horizon.clone(), Phase::Final)?;
        }
        log::info!(
            "built parameter store: {} parameters over {}..={}",
            names.len(),
            tp.schema.start_year,
            tp.schema.end_year
        );
        Ok(tp)
    }

    /// Extend one parameter with the current rates.
    pub(crate) fn extend_param(
        &mut self,
        name: &str,
        years: RangeInclusive<i32>,
        phase: Phase,
    ) -> Result<usize> {
        let param = self
            .params
            .get(name)
            .ok_or_else(|| TaxParamsError::ParameterNotFound(name.to_string()))?;
        let store = &self.store;
        let cpi = self.config.cpi_offset_param.as_str();
        let rates = self.rates.rates(|| offset_series(store, cpi))?;
        let mut engine =
            ExtensionEngine::new(&mut self.store, &mut self.views, rates, self.schema.horizon());
        engine.extend(param, years, phase)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Supported years, inclusive.
    pub fn horizon(&self) -> RangeInclusive<i32> {
        self.schema.horizon()
    }

    pub fn last_known_year(&self) -> Option<i32> {
        self.last_known_year
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    /// Parameter names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn is_indexed(&self, name: &str) -> Option<bool> {
        self.params.get(name).map(|p| p.indexed())
    }

    /// Value objects of `name` matching `selector`.
    pub fn select(&self, name: &str, selector: &Selector) -> Result<Vec<ValueObject>> {
        self.store.select(name, selector)
    }

    /// All values of one parameter.
    pub fn values(&self, name: &str) -> Result<&ParamValues> {
        self.store.values(name)
    }

    /// The value of `name` at `year` for one label combination.
    pub fn value_at(&self, name: &str, year: i32, labels: &Labels) -> Option<&Value> {
        self.store.values(name).ok()?.get(labels, year)
    }

    /// Initial Defaults of `name`.
    pub fn defaults(&self, name: &str) -> Result<&[ValueObject]> {
        self.store.get_default(name)
    }

    /// Current values of every parameter.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<ValueObject>> {
        self.params
            .keys()
            .filter_map(|name| {
                self.store
                    .values(name)
                    .ok()
                    .map(|values| (name.clone(), values.objects()))
            })
            .collect()
    }

    pub fn array(&self, name: &str) -> Option<&ParamArray> {
        self.views.get(name)
    }

    /// Label combinations of the columns of `array(name)`.
    pub fn array_columns(&self, name: &str) -> Option<&[Labels]> {
        self.views.get(name).map(|view| view.columns())
    }

    /// One year of `array(name)`.
    pub fn array_at(&self, name: &str, year: i32) -> Option<Array1<f64>> {
        self.views.get(name)?.row(year)
    }

    /// Current index rates, computing them if needed.
    pub fn rates(&mut self) -> Result<&IndexRates> {
        let store = &self.store;
        let cpi = self.config.cpi_offset_param.as_str();
        self.rates.rates(|| offset_series(store, cpi))
    }

    /// Price-inflation rate per horizon year, CPI offset included.
    pub fn inflation_rates(&mut self) -> Result<BTreeMap<i32, f64>> {
        Ok(self.rates()?.inflation().clone())
    }

    pub fn wage_rates(&mut self) -> Result<BTreeMap<i32, f64>> {
        Ok(self.rates()?.wage().clone())
    }

    /// Stored CPI offset values by year.
    pub fn offset_series(&self) -> Result<BTreeMap<i32, f64>> {
        offset_series(&self.store, &self.config.cpi_offset_param)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            values: self.store.checkpoint(),
            indexed: self
                .params
                .iter()
                .map(|(name, p)| (name.clone(), p.indexed_status().clone()))
                .collect(),
            rates: self.rates.cached().cloned(),
            views: self.views.clone(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.store.restore(checkpoint.values);
        for (name, indexed) in checkpoint.indexed {
            if let Some(param) = self.params.get_mut(&name) {
                param.restore_indexed(indexed);
            }
        }
        self.rates.restore(checkpoint.rates);
        self.views = checkpoint.views;
        log::debug!("parameter store restored from checkpoint");
    }
}
