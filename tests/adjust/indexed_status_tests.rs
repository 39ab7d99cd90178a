//! Indexed status adjustments.

use crate::test_helpers::{assert_gap_free, params, value};
use approx::assert_relative_eq;
use serde_json::json;

#[test]
fn test_status_off_stops_growth_from_the_change_year() {
    let mut params = params();
    let rates = params.inflation_rates().unwrap();

    params
        .adjust(&json!({"II_em-indexed": [{"year": 2018, "value": false}]}))
        .unwrap();

    assert_gap_free(&params);
    assert_eq!(params.is_indexed("II_em"), Some(false));
    assert_eq!(value(&params, "II_em", 2017, &[]), 4050.0);
    let flip = value(&params, "II_em", 2018, &[]);
    assert_relative_eq!(flip, 4050.0 * (1.0 + rates[&2017]), epsilon = 1e-9);
    for year in 2019..=2029 {
        assert_eq!(value(&params, "II_em", year, &[]), flip);
    }
}

#[test]
fn test_scalar_status_applies_from_the_start_year() {
    let mut params = params();
    params.adjust(&json!({"II_em-indexed": false})).unwrap();

    // Every value after the change year is recomputed, explicit ones included.
    for year in 2013..=2029 {
        assert_eq!(value(&params, "II_em", year, &[]), 3900.0);
    }
}

#[test]
fn test_status_and_value_in_the_same_year() {
    let mut params = params();
    let before_2019 = value(&params, "II_em", 2019, &[]);

    params
        .adjust(&json!({
            "II_em": [{"year": 2020, "value": 5000.0}],
            "II_em-indexed": [{"year": 2020, "value": false}]
        }))
        .unwrap();

    assert_eq!(value(&params, "II_em", 2019, &[]), before_2019);
    for year in 2020..=2029 {
        assert_eq!(value(&params, "II_em", year, &[]), 5000.0);
    }
}

#[test]
fn test_activating_indexing() {
    let mut params = params();
    let rates = params.inflation_rates().unwrap();

    params
        .adjust(&json!({"CTC_c-indexed": [{"year": 2019, "value": true}]}))
        .unwrap();

    assert_eq!(params.is_indexed("CTC_c"), Some(true));
    assert_eq!(value(&params, "CTC_c", 2018, &[]), 2000.0);
    assert_eq!(value(&params, "CTC_c", 2019, &[]), 2000.0);
    let mut expected = 2000.0;
    for year in 2020..=2029 {
        expected *= 1.0 + rates[&(year - 1)];
        assert_relative_eq!(value(&params, "CTC_c", year, &[]), expected, epsilon = 1e-6);
    }
}

#[test]
fn test_multiple_status_swaps() {
    let mut params = params();
    let rates = params.inflation_rates().unwrap();

    params
        .adjust(&json!({
            "II_em": [
                {"year": 2016, "value": 6000.0},
                {"year": 2018, "value": 7500.0},
                {"year": 2020, "value": 9000.0}
            ],
            "II_em-indexed": [
                {"year": 2016, "value": false},
                {"year": 2018, "value": true}
            ]
        }))
        .unwrap();

    assert_gap_free(&params);
    assert_eq!(params.is_indexed("II_em"), Some(true));
    assert_eq!(value(&params, "II_em", 2015, &[]), 4000.0);
    assert_eq!(value(&params, "II_em", 2016, &[]), 6000.0);
    // Not indexed between the swaps.
    assert_eq!(value(&params, "II_em", 2017, &[]), 6000.0);
    assert_eq!(value(&params, "II_em", 2018, &[]), 7500.0);
    assert_relative_eq!(
        value(&params, "II_em", 2019, &[]),
        7500.0 * (1.0 + rates[&2018]),
        epsilon = 1e-6
    );
    assert_eq!(value(&params, "II_em", 2020, &[]), 9000.0);
    assert_relative_eq!(
        value(&params, "II_em", 2021, &[]),
        9000.0 * (1.0 + rates[&2020]),
        epsilon = 1e-6
    );
}

#[test]
fn test_combined_call_matches_sequential_calls() {
    let mut combined = params();
    combined
        .adjust(&json!({
            "STD": [{"year": 2018, "MARS": "single", "value": 9000.0}],
            "STD-indexed": [{"year": 2021, "value": false}]
        }))
        .unwrap();

    let mut sequential = params();
    sequential
        .adjust(&json!({"STD": [{"year": 2018, "MARS": "single", "value": 9000.0}]}))
        .unwrap();
    sequential
        .adjust(&json!({"STD-indexed": [{"year": 2021, "value": false}]}))
        .unwrap();

    assert_eq!(combined.snapshot(), sequential.snapshot());
    assert_eq!(combined.is_indexed("STD"), Some(false));
}

#[test]
fn test_reapplying_an_earlier_value_with_status_change() {
    let mut params = params();
    let rates = params.inflation_rates().unwrap();
    let payload = json!({
        "II_em": [{"year": 2016, "value": 6000.0}],
        "II_em-indexed": [{"year": 2018, "value": false}]
    });

    params.adjust(&payload).unwrap();
    let once = params.snapshot();
    params.adjust(&payload).unwrap();

    assert_eq!(params.snapshot(), once);
    assert_eq!(value(&params, "II_em", 2016, &[]), 6000.0);
    assert_eq!(value(&params, "II_em", 2017, &[]), 4050.0);
    let flip = value(&params, "II_em", 2018, &[]);
    assert_relative_eq!(flip, 4050.0 * (1.0 + rates[&2017]), epsilon = 1e-9);
    for year in 2019..=2029 {
        assert_eq!(value(&params, "II_em", year, &[]), flip);
    }
}

#[test]
fn test_status_change_then_earlier_value_keeps_the_flip_year() {
    let mut params = params();
    let rates = params.inflation_rates().unwrap();

    params
        .adjust(&json!({"II_em-indexed": [{"year": 2018, "value": false}]}))
        .unwrap();
    params
        .adjust(&json!({"II_em": [{"year": 2017, "value": 5000.0}]}))
        .unwrap();

    // Growth into 2018 still follows the status before the change.
    let flip = value(&params, "II_em", 2018, &[]);
    assert_relative_eq!(flip, 5000.0 * (1.0 + rates[&2017]), epsilon = 1e-9);
    assert_eq!(value(&params, "II_em", 2029, &[]), flip);
    assert_eq!(params.is_indexed("II_em"), Some(false));
}

#[test]
fn test_status_change_refreshes_array_view() {
    let mut params = params();
    params.adjust(&json!({"EITC_c-indexed": [{"year": 2020, "value": false}]})).unwrap();
    let row_2020 = params.array_at("EITC_c", 2020).unwrap();
    let row_2029 = params.array_at("EITC_c", 2029).unwrap();
    assert_eq!(row_2020, row_2029);
}
