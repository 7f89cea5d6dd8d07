//! Verify query encoding against JSON test vectors stored in `test-vectors/`.
//!
//! Each case lists params as ordered `[key, value]` pairs and the exact query
//! string expected. The encoded output is also parsed back with a standard
//! form decoder to check the key set and per-key values.

use chrono::{DateTime, Utc};
use request_core::query::encode;
use request_core::{QueryParams, QueryValue};
use serde_json::Value;
use url::form_urlencoded;

/// Convert a vector value, recognising `{"$date": "..."}` as a date.
fn to_query_value(value: &Value) -> QueryValue {
    if let Some(raw) = value.get("$date").and_then(Value::as_str) {
        let at: DateTime<Utc> = raw.parse().unwrap();
        return QueryValue::Date(at);
    }
    QueryValue::from(value.clone())
}

fn params_of(case: &Value) -> QueryParams {
    let mut params = QueryParams::new();
    for pair in case["params"].as_array().unwrap() {
        let pair = pair.as_array().unwrap();
        params.set(pair[0].as_str().unwrap(), to_query_value(&pair[1]));
    }
    params
}

#[test]
fn query_test_vectors() {
    let raw = include_str!("../../test-vectors/query.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let params = params_of(case);
        let encoded = encode(Some(&params));
        assert_eq!(encoded, case["expected"].as_str().unwrap(), "{name}");

        // Parsing the output back yields exactly the non-null keys, each with
        // its per-rule encoding.
        let decoded: Vec<(String, String)> =
            form_urlencoded::parse(encoded.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect();
        let expected: Vec<(String, String)> = params
            .iter()
            .filter_map(|(k, v)| v.encode().map(|s| (k.to_string(), s)))
            .collect();
        assert_eq!(decoded, expected, "{name}: round trip");
    }
}
