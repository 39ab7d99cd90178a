//! # Rate Provider
//!
//! Index rates for every horizon year. The price-inflation rate of a year is
//! the forecast rate plus the CPI offset in effect for that year, rounded to
//! a fixed number of decimal digits. The wage-growth rate is the forecast
//! rate unchanged.
//!
//! The provider caches the rates it computes. The cache belongs to the store
//! and must be invalidated whenever the CPI offset changes; a request against
//! an empty cache computes the rates on the spot.

use crate::error::{Result, TaxParamsError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Which index rate a parameter grows with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthBasis {
    /// Price inflation (CPI) plus the CPI offset
    Price,
    /// Wage growth
    Wage,
}

/// Source of baseline growth-rate forecasts.
///
/// Implementations must be pure functions of the requested year range.
pub trait RateForecast: fmt::Debug {
    /// Annual price-inflation rates for `start..=end`.
    fn price_inflation_rates(&self, start: i32, end: i32) -> Result<Vec<f64>>;

    /// Annual wage-growth rates for `start..=end`.
    fn wage_growth_rates(&self, start: i32, end: i32) -> Result<Vec<f64>>;
}

/// A forecast given as two fixed tables starting at `start_year`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticForecast {
    pub start_year: i32,
    pub price_inflation: Vec<f64>,
    pub wage_growth: Vec<f64>,
}

const BUNDLED_GROWFACTORS: &str = include_str!("../data/growfactors.json");

impl StaticForecast {
    pub fn new(start_year: i32, price_inflation: Vec<f64>, wage_growth: Vec<f64>) -> Self {
        Self {
            start_year,
            price_inflation,
            wage_growth,
        }
    }

    /// The forecast shipped with the crate (2013 to 2029).
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_GROWFACTORS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    fn slice(&self, series: &[f64], start: i32, end: i32, what: &str) -> Result<Vec<f64>> {
        let last = self.start_year + series.len() as i32 - 1;
        if start < self.start_year || end > last || start > end {
            return Err(TaxParamsError::RateUnavailable(format!(
                "{} forecast covers {}..={}, requested {}..={}",
                what, self.start_year, last, start, end
            )));
        }
        let from = (start - self.start_year) as usize;
        let to = (end - self.start_year) as usize;
        Ok(series[from..=to].to_vec())
    }
}

impl RateForecast for StaticForecast {
    fn price_inflation_rates(&self, start: i32, end: i32) -> Result<Vec<f64>> {
        self.slice(&self.price_inflation, start, end, "price inflation")
    }

    fn wage_growth_rates(&self, start: i32, end: i32) -> Result<Vec<f64>> {
        self.slice(&self.wage_growth, start, end, "wage growth")
    }
}

/// Computed index rates for the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRates {
    inflation: BTreeMap<i32, f64>,
    wage: BTreeMap<i32, f64>,
    wage_indexed: BTreeSet<String>,
}

impl IndexRates {
    pub fn inflation(&self) -> &BTreeMap<i32, f64> {
        &self.inflation
    }

    pub fn wage(&self) -> &BTreeMap<i32, f64> {
        &self.wage
    }

    pub fn rate(&self, basis: GrowthBasis, year: i32) -> Option<f64> {
        match basis {
            GrowthBasis::Price => self.inflation.get(&year).copied(),
            GrowthBasis::Wage => self.wage.get(&year).copied(),
        }
    }

    /// Wage rate for wage-indexed parameters, inflation rate for the rest.
    pub fn rate_for(&self, param: &str, year: i32) -> Option<f64> {
        if self.wage_indexed.contains(param) {
            self.wage.get(&year).copied()
        } else {
            self.inflation.get(&year).copied()
        }
    }
}

/// CPI offset in effect at `year`: the latest offset at or before it, or zero.
pub fn offset_at(offsets: &BTreeMap<i32, f64>, year: i32) -> f64 {
    offsets
        .range(..=year)
        .next_back()
        .map(|(_, v)| *v)
        .unwrap_or(0.0)
}

fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round() / scale
}

/// Store-owned rate cache.
#[derive(Debug)]
pub struct RateProvider {
    forecast: Box<dyn RateForecast>,
    wage_indexed: BTreeSet<String>,
    precision: u32,
    start_year: i32,
    end_year: i32,
    cache: Option<IndexRates>,
}

impl RateProvider {
    pub fn new(
        forecast: Box<dyn RateForecast>,
        wage_indexed: BTreeSet<String>,
        precision: u32,
        start_year: i32,
        end_year: i32,
    ) -> Self {
        Self {
            forecast,
            wage_indexed,
            precision,
            start_year,
            end_year,
            cache: None,
        }
    }

    /// Growth basis of a parameter name.
    pub fn basis_for(&self, param: &str) -> GrowthBasis {
        if self.wage_indexed.contains(param) {
            GrowthBasis::Wage
        } else {
            GrowthBasis::Price
        }
    }

    /// Drop the cached rates.
    pub fn invalidate(&mut self) {
        if self.cache.take().is_some() {
            log::debug!("index rates invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cached(&self) -> Option<&IndexRates> {
        self.cache.as_ref()
    }

    /// Compute the rates for the whole horizon from the given CPI offsets.
    ///
    /// Offsets are carried forward from their last year; years before the
    /// first offset use zero.
    pub fn recompute(&mut self, offsets: &BTreeMap<i32, f64>) -> Result<&IndexRates> {
        let (start, end) = (self.start_year, self.end_year);
        let price = self.forecast.price_inflation_rates(start, end)?;
        let wage = self.forecast.wage_growth_rates(start, end)?;
        let years = (end - start + 1) as usize;
        if price.len() != years || wage.len() != years {
            return Err(TaxParamsError::RateUnavailable(format!(
                "forecast returned {} price and {} wage rates for {} years",
                price.len(),
                wage.len(),
                years
            )));
        }

        let inflation = (start..=end)
            .zip(price)
            .map(|(year, rate)| (year, round_to(rate + offset_at(offsets, year), self.precision)))
            .collect();
        let wage = (start..=end).zip(wage).collect();

        log::debug!("index rates recomputed for {}..={}", start, end);
        Ok(&*self.cache.insert(IndexRates {
            inflation,
            wage,
            wage_indexed: self.wage_indexed.clone(),
        }))
    }

    /// Cached rates, computing them first if the cache is empty.
    pub fn rates<F>(&mut self, offsets: F) -> Result<&IndexRates>
    where
        F: FnOnce() -> Result<BTreeMap<i32, f64>>,
    {
        if self.cache.is_none() {
            let offsets = offsets()?;
            self.recompute(&offsets)?;
        }
        self.cache
            .as_ref()
            .ok_or_else(|| TaxParamsError::RateUnavailable("rates were not computed".to_string()))
    }

    pub(crate) fn restore(&mut self, cache: Option<IndexRates>) {
        self.cache = cache;
    }
}
