//! Query-string encoding for endpoint parameters.
//!
//! Parameters are a flat, ordered mapping of names to `QueryValue`s. Each kind
//! of value has one string form:
//!
//! - `Null` drops the key.
//! - `Date` becomes the millisecond-within-second of the instant, so
//!   `12:00:00.250Z` encodes as `250`. The rest of the timestamp is lost.
//! - `List` joins its elements with `,`. Inside a list, `Null` is written
//!   as `null`, a `Date` as RFC 3339 with milliseconds, a nested list is
//!   flattened into the same comma-joined string, and an `Object` as its
//!   compact JSON rather than an opaque placeholder.
//! - `Object` becomes compact JSON.
//! - scalars use their plain string form.
//!
//! The pairs are then form-urlencoded.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use url::form_urlencoded;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(DateTime<Utc>),
    List(Vec<QueryValue>),
    Object(Map<String, Value>),
}

impl QueryValue {
    /// The encoded form of this value, or `None` when the key is dropped.
    pub fn encode(&self) -> Option<String> {
        match self {
            QueryValue::Null => None,
            QueryValue::Date(at) => Some(at.timestamp_subsec_millis().to_string()),
            QueryValue::List(items) => Some(join(items)),
            QueryValue::Object(map) => Some(Value::Object(map.clone()).to_string()),
            scalar => Some(scalar_string(scalar)),
        }
    }
}

fn join(items: &[QueryValue]) -> String {
    items.iter().map(element_string).collect::<Vec<_>>().join(",")
}

/// String form of a value nested inside a list.
fn element_string(value: &QueryValue) -> String {
    match value {
        QueryValue::Null => "null".to_string(),
        QueryValue::Date(at) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
        QueryValue::List(items) => join(items),
        QueryValue::Object(map) => Value::Object(map.clone()).to_string(),
        scalar => scalar_string(scalar),
    }
}

fn scalar_string(value: &QueryValue) -> String {
    match value {
        QueryValue::Bool(b) => b.to_string(),
        QueryValue::Int(n) => n.to_string(),
        QueryValue::Float(f) => float_string(*f),
        QueryValue::Str(s) => s.clone(),
        other => element_string(other),
    }
}

fn float_string(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if f == 0.0 {
        "0".to_string()
    } else if f.abs() >= 1e21 || f.abs() < 1e-6 {
        let sci = format!("{f:e}");
        match sci.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => sci,
        }
    } else if f.fract() == 0.0 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

impl From<i32> for QueryValue {
    fn from(n: i32) -> Self {
        QueryValue::Int(n.into())
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        QueryValue::Int(n)
    }
}

impl From<u32> for QueryValue {
    fn from(n: u32) -> Self {
        QueryValue::Int(n.into())
    }
}

impl From<f64> for QueryValue {
    fn from(f: f64) -> Self {
        QueryValue::Float(f)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(at: DateTime<Utc>) -> Self {
        QueryValue::Date(at)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Null, Into::into)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(items: Vec<T>) -> Self {
        QueryValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for QueryValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => QueryValue::Null,
            Value::Bool(b) => QueryValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => QueryValue::Int(i),
                None => QueryValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => QueryValue::Str(s),
            Value::Array(items) => QueryValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => QueryValue::Object(map),
        }
    }
}

/// Ordered parameter mapping. Setting an existing key replaces its value in
/// place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Builder form of `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

/// Conversion from typed endpoint parameters into a `QueryParams` mapping.
pub trait ToQuery {
    fn to_query(&self) -> QueryParams;
}

impl ToQuery for () {
    fn to_query(&self) -> QueryParams {
        QueryParams::new()
    }
}

impl ToQuery for QueryParams {
    fn to_query(&self) -> QueryParams {
        self.clone()
    }
}

impl<T: ToQuery> ToQuery for Option<T> {
    fn to_query(&self) -> QueryParams {
        self.as_ref().map(ToQuery::to_query).unwrap_or_default()
    }
}

/// Encode parameters as a query string, including the leading `?`.
///
/// Returns an empty string when there are no parameters or every value is
/// `Null`.
pub fn encode(params: Option<&QueryParams>) -> String {
    let Some(params) = params else {
        return String::new();
    };
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut written = 0;
    for (key, value) in params.iter() {
        if let Some(encoded) = value.encode() {
            serializer.append_pair(key, &encoded);
            written += 1;
        }
    }
    if written == 0 {
        return String::new();
    }
    format!("?{}", serializer.finish())
}
