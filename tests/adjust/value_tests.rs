//! Plain value adjustments.

use crate::test_helpers::{assert_gap_free, labels, params, value};
use approx::assert_relative_eq;
use serde_json::json;
use taxparams_rs::{Value, ValueObject};

#[test]
fn test_value_change_re_extends_later_years() {
    let mut params = params();
    let rates = params.inflation_rates().unwrap();

    params
        .adjust(&json!({"II_em": [{"year": 2020, "value": 5000.0}]}))
        .unwrap();

    assert_gap_free(&params);
    assert_eq!(value(&params, "II_em", 2020, &[]), 5000.0);
    assert_relative_eq!(
        value(&params, "II_em", 2022, &[]),
        5000.0 * (1.0 + rates[&2020]) * (1.0 + rates[&2021]),
        epsilon = 1e-6
    );
    // Earlier years are untouched.
    assert_eq!(value(&params, "II_em", 2017, &[]), 4050.0);
}

#[test]
fn test_labeled_value_leaves_other_labels_alone() {
    let mut params = params();
    let before = value(&params, "STD", 2021, &[("MARS", "mjoint")]);

    params
        .adjust(&json!({"STD": [{"year": 2019, "MARS": "single", "value": 10000}]}))
        .unwrap();

    assert_eq!(value(&params, "STD", 2019, &[("MARS", "single")]), 10000.0);
    assert_eq!(value(&params, "STD", 2021, &[("MARS", "mjoint")]), before);
    // The explicit 2026 default survives a change before it.
    assert_eq!(value(&params, "STD", 2026, &[("MARS", "single")]), 7500.0);
}

#[test]
fn test_scalar_applies_to_every_label_combination() {
    let mut params = params();
    let report = params.adjust(&json!({"EITC_c": 600})).unwrap();

    assert_eq!(report["EITC_c"].len(), 2);
    assert!(report["EITC_c"].iter().all(|vo| vo.year == 2013));
    assert_eq!(value(&params, "EITC_c", 2013, &[("EIC", "0kids")]), 600.0);
    assert_eq!(value(&params, "EITC_c", 2013, &[("EIC", "1kid")]), 600.0);
}

#[test]
fn test_unindexed_value_carries_forward() {
    let mut params = params();
    params
        .adjust(&json!({"ID_Medical_frt": [{"year": 2019, "value": 0.075}]}))
        .unwrap();
    assert_eq!(value(&params, "ID_Medical_frt", 2018, &[]), 0.1);
    assert_eq!(value(&params, "ID_Medical_frt", 2029, &[]), 0.075);

    params.adjust(&json!({"CG_nodiff": [{"year": 2025, "value": true}]})).unwrap();
    assert_eq!(
        params.value_at("CG_nodiff", 2029, &labels(&[])),
        Some(&Value::Bool(true))
    );
    assert_eq!(params.array_at("CG_nodiff", 2029).unwrap()[0], 1.0);
}

#[test]
fn test_report_contents() {
    let mut params = params();
    let report = params
        .adjust(&json!({
            "II_em": 5000,
            "STD-indexed": false,
            "CPI_offset": [{"year": 2020, "value": -0.001}]
        }))
        .unwrap();

    assert_eq!(report.len(), 3);
    // Values are reported after coercion to the declared type.
    assert_eq!(report["II_em"], vec![ValueObject::new(2013, Value::Float(5000.0))]);
    assert_eq!(report["STD-indexed"], vec![ValueObject::new(2013, Value::Bool(false))]);
    assert_eq!(report["CPI_offset"][0].year, 2020);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["STD-indexed"], json!([{"year": 2013, "value": false}]));
    assert_eq!(json["II_em"], json!([{"year": 2013, "value": 5000.0}]));
}

#[test]
fn test_adjust_from_string_and_file() {
    let mut params = params();
    params
        .adjust_json(r#"{"CTC_c": [{"year": 2021, "value": 3000}]}"#)
        .unwrap();
    assert_eq!(value(&params, "CTC_c", 2023, &[]), 3000.0);

    let path = std::env::temp_dir().join("taxparams_rs_adjust_test.json");
    std::fs::write(&path, r#"{"CTC_c": [{"year": 2022, "value": 3600}]}"#).unwrap();
    params.adjust_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(value(&params, "CTC_c", 2021, &[]), 3000.0);
    assert_eq!(value(&params, "CTC_c", 2023, &[]), 3600.0);
}
