//! Rejected and failed adjustments leave the store unchanged.

use crate::test_helpers::{definitions, params};
use serde_json::json;
use std::cell::Cell;
use taxparams_rs::rates::RateForecast;
use taxparams_rs::{Result, StaticForecast, TaxParams, TaxParamsError};

#[test]
fn test_malformed_input() {
    let mut params = params();
    let before = params.snapshot();

    for payload in [
        json!(["II_em", 5000]),
        json!({"II_em-indexed": "no"}),
        json!({"II_em-indexed": [{"year": 2020, "value": 0}]}),
        json!({"II_em": {"2020": 5000}}),
    ] {
        match params.adjust(&payload) {
            Err(TaxParamsError::MalformedInput(_)) => {}
            other => panic!("Expected MalformedInput for {}, got {:?}", payload, other),
        }
    }
    assert_eq!(params.snapshot(), before);
}

#[test]
fn test_non_indexable_parameter() {
    let mut params = params();
    let before = params.snapshot();

    let err = params
        .adjust(&json!({"II_em": 5000, "ID_Medical_frt-indexed": true}))
        .unwrap_err();
    match err {
        TaxParamsError::InvalidOperation { param, .. } => assert_eq!(param, "ID_Medical_frt"),
        other => panic!("Expected InvalidOperation, got {:?}", other),
    }
    assert_eq!(params.snapshot(), before);
    assert_eq!(params.is_indexed("II_em"), Some(true));
}

#[test]
fn test_validation_errors_are_aggregated() {
    let mut params = params();
    let before = params.snapshot();

    let err = params
        .adjust(&json!({
            "II_em": [{"year": 2020, "value": -1.0}],
            "STD": [{"year": 2020, "MARS": "married", "value": 1.0}],
            "CPI_offset": [{"year": 2020, "value": 0.5}],
            "II_em-indexed": false
        }))
        .unwrap_err();
    match err {
        TaxParamsError::Validation(errors) => {
            assert!(errors.get("II_em").is_some());
            // An unknown label choice also names a combination with no values.
            assert_eq!(errors.get("STD").unwrap().len(), 2);
            assert!(errors.get("CPI_offset").is_some());
            assert_eq!(errors.len(), 4);
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
    assert_eq!(params.snapshot(), before);
    assert_eq!(params.is_indexed("II_em"), Some(true));
}

/// A forecast that fails once it has been asked `limit` times.
#[derive(Debug)]
struct FlakyForecast {
    inner: StaticForecast,
    calls: Cell<usize>,
    limit: usize,
}

impl RateForecast for FlakyForecast {
    fn price_inflation_rates(&self, start: i32, end: i32) -> Result<Vec<f64>> {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);
        if calls > self.limit {
            return Err(TaxParamsError::RateUnavailable("forecast service down".to_string()));
        }
        self.inner.price_inflation_rates(start, end)
    }

    fn wage_growth_rates(&self, start: i32, end: i32) -> Result<Vec<f64>> {
        self.inner.wage_growth_rates(start, end)
    }
}

#[test]
fn test_failure_during_execution_restores_state() {
    let forecast = FlakyForecast {
        inner: StaticForecast::bundled().unwrap(),
        calls: Cell::new(0),
        limit: 1,
    };
    let mut params = TaxParams::new(definitions(), forecast).unwrap();
    let before = params.snapshot();
    let rates = params.inflation_rates().unwrap();

    let err = params
        .adjust(&json!({
            "CPI_offset": [{"year": 2020, "value": -0.001}],
            "STD-indexed": [{"year": 2018, "value": false}]
        }))
        .unwrap_err();
    assert!(matches!(err, TaxParamsError::RateUnavailable(_)));

    assert_eq!(params.snapshot(), before);
    assert_eq!(params.is_indexed("STD"), Some(true));
    assert_eq!(params.inflation_rates().unwrap(), rates);
    assert_eq!(params.offset_series().unwrap()[&2020], 0.0);
}

#[test]
fn test_new_label_combination_is_rejected() {
    let mut params = params();
    let err = params
        .adjust(&json!({"EITC_c": [{"year": 2020, "EIC": "2kids", "value": 5000.0}]}))
        .unwrap_err();
    match err {
        TaxParamsError::Validation(errors) => {
            assert!(errors.get("EITC_c").unwrap()[0].contains("no values exist"));
        }
        other => panic!("Expected Validation, got {:?}", other),
    }
}
