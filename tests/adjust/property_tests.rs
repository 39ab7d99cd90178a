//! Randomized invariant checks over sequences of adjustments.

use crate::test_helpers::{assert_gap_free, params};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};

const MARS: [&str; 2] = ["single", "mjoint"];

fn random_payload(rng: &mut ChaCha8Rng) -> Value {
    let mut payload = serde_json::Map::new();

    if rng.gen_bool(0.3) {
        let offset = rng.gen_range(-50..=50) as f64 / 10_000.0;
        payload.insert(
            "CPI_offset".to_string(),
            json!([{"year": rng.gen_range(2014..=2029), "value": offset}]),
        );
    }

    if rng.gen_bool(0.5) {
        let entries: Vec<Value> = (0..rng.gen_range(1..=3))
            .map(|_| {
                json!({
                    "year": rng.gen_range(2013..=2029),
                    "MARS": MARS.choose(rng).unwrap(),
                    "value": rng.gen_range(5_000.0..30_000.0),
                })
            })
            .collect();
        payload.insert("STD".to_string(), Value::Array(entries));
    }

    if rng.gen_bool(0.4) {
        payload.insert(
            "II_em-indexed".to_string(),
            json!([{"year": rng.gen_range(2013..=2029), "value": rng.gen_bool(0.5)}]),
        );
    }
    if rng.gen_bool(0.5) {
        payload.insert(
            "II_em".to_string(),
            json!([{"year": rng.gen_range(2013..=2029), "value": rng.gen_range(1_000.0..9_000.0)}]),
        );
    }

    Value::Object(payload)
}

#[test]
fn test_adjustments_keep_the_store_gap_free() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut params = params();

    for _ in 0..30 {
        let payload = random_payload(&mut rng);
        params.adjust(&payload).unwrap();
        assert_gap_free(&params);
    }
}

#[test]
fn test_reapplying_a_payload_changes_nothing() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut params = params();

    for _ in 0..30 {
        let payload = random_payload(&mut rng);
        params.adjust(&payload).unwrap();
        let once = params.snapshot();
        params.adjust(&payload).unwrap();
        assert_eq!(params.snapshot(), once, "payload {}", payload);
    }
}
