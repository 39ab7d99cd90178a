//! Selection over a built store.

use crate::test_helpers::{labels, params};
use taxparams_rs::store::{Comparator, Selector};
use taxparams_rs::{TaxParamsError, Value};

#[test]
fn test_select_by_year_and_label() {
    let params = params();

    let single = params
        .select("STD", &Selector::gte(2020).with_label("MARS", "single"))
        .unwrap();
    assert_eq!(single.len(), 10);
    assert!(single.iter().all(|vo| vo.year >= 2020));
    assert!(single.iter().all(|vo| vo.labels["MARS"] == "single"));

    let one = params
        .select("STD", &Selector::year(Comparator::Eq, 2026).with_labels(&labels(&[("MARS", "mjoint")])))
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].value, Value::Float(15000.0));
    assert!(!one[0].auto);

    let early = params.select("II_em", &Selector::lt(2015)).unwrap();
    assert_eq!(early.len(), 2);
}

#[test]
fn test_explicit_and_extrapolated_values() {
    let params = params();
    let explicit = params.select("II_em", &Selector::all().explicit_only()).unwrap();
    assert_eq!(explicit.len(), 5);
    assert_eq!(explicit, params.defaults("II_em").unwrap());

    let auto = params.select("II_em", &Selector::gt(2013).extrapolated_only()).unwrap();
    assert_eq!(auto.len(), 12);
    assert!(auto.iter().all(|vo| vo.year > 2017 && vo.auto));
}

#[test]
fn test_unknown_parameter() {
    let params = params();
    assert!(matches!(
        params.select("II_brk9", &Selector::all()),
        Err(TaxParamsError::ParameterNotFound(_))
    ));
    assert!(params.value_at("II_brk9", 2013, &labels(&[])).is_none());
    assert!(params.parameter("II_brk9").is_none());
}

#[test]
fn test_report_values_serialize_without_auto_marker() {
    let params = params();
    let vos = params.select("CTC_c", &Selector::eq(2019)).unwrap();
    let json = serde_json::to_value(&vos).unwrap();
    assert_eq!(json[0]["_auto"], serde_json::Value::Bool(true));

    let explicit = params.select("CTC_c", &Selector::eq(2018)).unwrap();
    let json = serde_json::to_value(&explicit).unwrap();
    assert!(json[0].get("_auto").is_none());
    assert_eq!(json[0]["year"], 2018);
}
